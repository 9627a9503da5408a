use crate::domain::{FinalizedTransition, RecordVersion, StateRef};
use crate::foundation::{EstateError, RecordId, TransitionId};
use crate::infrastructure::storage::RecordStore;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryInner {
    versions: HashMap<StateRef, RecordVersion>,
    current: HashMap<RecordId, BTreeSet<StateRef>>,
    history: HashMap<RecordId, Vec<StateRef>>,
    transitions: HashMap<TransitionId, FinalizedTransition>,
}

impl MemoryInner {
    fn insert_current(&mut self, version: RecordVersion) {
        let state_ref = version.state_ref;
        if self.versions.insert(state_ref, version).is_none() {
            self.history.entry(state_ref.record_id).or_default().push(state_ref);
        }
        self.current.entry(state_ref.record_id).or_default().insert(state_ref);
    }

    fn retire(&mut self, state_ref: &StateRef) {
        if let Some(current) = self.current.get_mut(&state_ref.record_id) {
            current.remove(state_ref);
            if current.is_empty() {
                self.current.remove(&state_ref.record_id);
            }
        }
    }
}

/// In-memory record store; one per party.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `version` as current without retiring anything. Used to import state from elsewhere.
    pub fn import_version(&self, version: RecordVersion) -> Result<(), EstateError> {
        self.lock_inner()?.insert_current(version);
        Ok(())
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, MemoryInner>, EstateError> {
        self.inner.lock().map_err(|_| crate::storage_err!("memory record store lock", "poisoned"))
    }
}

impl RecordStore for MemoryRecordStore {
    fn current_versions(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>, EstateError> {
        let inner = self.lock_inner()?;
        let Some(refs) = inner.current.get(record_id) else {
            return Ok(Vec::new());
        };
        Ok(refs.iter().filter_map(|state_ref| inner.versions.get(state_ref).cloned()).collect())
    }

    fn mark_finalized(&self, finalized: &FinalizedTransition) -> Result<bool, EstateError> {
        let mut inner = self.lock_inner()?;
        let transition_id = finalized.id();
        if inner.transitions.contains_key(&transition_id) {
            return Ok(false);
        }
        for state_ref in finalized.signed.transition.consumed_refs() {
            inner.retire(&state_ref);
        }
        for version in finalized.output_versions() {
            inner.insert_current(version);
        }
        inner.transitions.insert(transition_id, finalized.clone());
        Ok(true)
    }

    fn history(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>, EstateError> {
        let inner = self.lock_inner()?;
        let mut versions: Vec<RecordVersion> = inner
            .history
            .get(record_id)
            .map(|refs| refs.iter().filter_map(|state_ref| inner.versions.get(state_ref).cloned()).collect())
            .unwrap_or_default();
        versions.sort_by_key(|version| version.sequence);
        Ok(versions)
    }

    fn list_current(&self) -> Result<Vec<RecordVersion>, EstateError> {
        let inner = self.lock_inner()?;
        let mut versions: Vec<RecordVersion> =
            inner.current.values().flat_map(|refs| refs.iter()).filter_map(|state_ref| inner.versions.get(state_ref).cloned()).collect();
        versions.sort_by_key(|version| version.record_id());
        Ok(versions)
    }

    fn get_transition(&self, transition_id: &TransitionId) -> Result<Option<FinalizedTransition>, EstateError> {
        Ok(self.lock_inner()?.transitions.get(transition_id).cloned())
    }
}
