use crate::domain::{FinalizedTransition, RecordVersion};
use crate::foundation::{EstateError, RecordId, TransitionId};

pub type Result<T> = std::result::Result<T, EstateError>;

/// One party's view of committed record versions.
pub trait RecordStore: Send + Sync {
    /// Every unconsumed version of `record_id`. More than one means the store is broken.
    fn current_versions(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>>;

    /// The single current version of `record_id`.
    fn get_current(&self, record_id: &RecordId) -> Result<RecordVersion> {
        let mut versions = self.current_versions(record_id)?;
        match versions.len() {
            0 => Err(EstateError::NotFound(*record_id)),
            1 => Ok(versions.remove(0)),
            count => Err(EstateError::StoreInconsistent { record_id: *record_id, current_versions: count }),
        }
    }

    /// Retires the versions `finalized` consumed and records the ones it produced.
    ///
    /// Returns `Ok(false)` when the transition was already recorded; nothing changes in that case.
    fn mark_finalized(&self, finalized: &FinalizedTransition) -> Result<bool>;

    /// Every version of `record_id` ever recorded here, oldest first. Superseded versions stay readable.
    fn history(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>>;

    fn list_current(&self) -> Result<Vec<RecordVersion>>;

    fn get_transition(&self, transition_id: &TransitionId) -> Result<Option<FinalizedTransition>>;
}
