use crate::foundation::{EstateError, RecordId};
use log::trace;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-record advisory locks for one node: a record may be the input of only one local attempt
/// at a time.
#[derive(Clone, Default)]
pub struct RecordLocks {
    held: Arc<Mutex<HashSet<RecordId>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `RecordLocked` instead of waiting when another attempt holds the lock.
    pub fn try_acquire(&self, record_id: RecordId) -> Result<RecordLockGuard, EstateError> {
        let mut held = self.held.lock().map_err(|_| crate::storage_err!("record lock table", "poisoned"))?;
        if !held.insert(record_id) {
            return Err(EstateError::RecordLocked(record_id));
        }
        trace!("record lock acquired record_id={}", record_id);
        Ok(RecordLockGuard { held: Arc::clone(&self.held), record_id })
    }

    pub fn is_locked(&self, record_id: &RecordId) -> bool {
        self.held.lock().map(|held| held.contains(record_id)).unwrap_or(false)
    }
}

/// Releases its record when dropped.
pub struct RecordLockGuard {
    held: Arc<Mutex<HashSet<RecordId>>>,
    record_id: RecordId,
}

impl RecordLockGuard {
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }
}

impl Drop for RecordLockGuard {
    fn drop(&mut self) {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.record_id);
        trace!("record lock released record_id={}", self.record_id);
    }
}
