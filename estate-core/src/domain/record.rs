use crate::foundation::{PartyId, RecordId, TransitionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One version of a property's ownership and tenancy.
///
/// `record_id`, `constructed_at_nanos`, `area` and `address` are fixed at creation; no transition
/// changes them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: RecordId,
    pub owners: Vec<PartyId>,
    pub tenants: Vec<PartyId>,
    pub constructed_at_nanos: u64,
    pub area: i64,
    pub address: String,
}

impl Record {
    /// Everyone with a stake in this version: owners ∪ tenants.
    pub fn participants(&self) -> BTreeSet<PartyId> {
        self.owners.iter().chain(self.tenants.iter()).cloned().collect()
    }

    pub fn is_owner(&self, party: &PartyId) -> bool {
        self.owners.contains(party)
    }

    pub fn is_tenant(&self, party: &PartyId) -> bool {
        self.tenants.contains(party)
    }

    pub fn with_owners(&self, owners: Vec<PartyId>) -> Self {
        Self { owners, ..self.clone() }
    }

    pub fn with_tenants(&self, tenants: Vec<PartyId>) -> Self {
        Self { tenants, ..self.clone() }
    }
}

/// Names one committed version: the record plus the transition that produced it.
///
/// Content alone is not unique (renting and then cancelling restores identical content), so
/// versions are addressed by their producing transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    pub record_id: RecordId,
    pub transition_id: TransitionId,
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.record_id, self.transition_id.short())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordVersion {
    pub state_ref: StateRef,
    /// 0 for the version produced by Create, +1 for every later transition.
    pub sequence: u64,
    pub record: Record,
}

impl RecordVersion {
    pub fn record_id(&self) -> RecordId {
        self.state_ref.record_id
    }
}
