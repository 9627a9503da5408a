use crate::domain::Record;
use crate::foundation::PartyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which parties of a record must co-sign a transition that touches it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerPolicy {
    /// Owners and tenants of every consumed and produced version.
    #[default]
    OwnersAndTenants,
    /// Owners only; tenants are informed but never asked.
    OwnersOnly,
}

impl SignerPolicy {
    pub fn signers_of(self, record: &Record) -> BTreeSet<PartyId> {
        match self {
            SignerPolicy::OwnersAndTenants => record.participants(),
            SignerPolicy::OwnersOnly => record.owners.iter().cloned().collect(),
        }
    }

    /// Union of the signers of every input and output version.
    pub fn required_signers<'a>(self, records: impl IntoIterator<Item = &'a Record>) -> BTreeSet<PartyId> {
        records.into_iter().flat_map(|record| self.signers_of(record)).collect()
    }
}
