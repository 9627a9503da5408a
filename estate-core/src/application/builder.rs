use crate::domain::validation::validate_proposal;
use crate::domain::{Command, CommandKind, Record, RecordVersion, SignedTransition, SignerPolicy, Transition};
use crate::foundation::{now_nanos, EstateError, PartyId, RecordId};
use crate::infrastructure::storage::RecordStore;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// Turns a command into a validated, not yet signed transition. Never touches the network.
pub struct ProposalBuilder {
    party: PartyId,
    notary: PartyId,
    policy: SignerPolicy,
    store: Arc<dyn RecordStore>,
}

impl ProposalBuilder {
    pub fn new(party: PartyId, notary: PartyId, policy: SignerPolicy, store: Arc<dyn RecordStore>) -> Self {
        Self { party, notary, policy, store }
    }

    pub fn build(&self, command: &Command) -> Result<SignedTransition, EstateError> {
        let (inputs, output) = match command {
            Command::Create { owners, tenants, area, address } => {
                let record = Record {
                    record_id: RecordId::new_v4(),
                    owners: dedup(owners),
                    tenants: dedup(tenants),
                    constructed_at_nanos: now_nanos(),
                    area: *area,
                    address: address.clone(),
                };
                (Vec::new(), record)
            }
            Command::Sell { record_id, new_owners } => {
                let current = self.store.get_current(record_id)?;
                let output = current.record.with_owners(dedup(new_owners));
                (vec![current], output)
            }
            Command::Rent { record_id, new_tenants } => {
                let current = self.store.get_current(record_id)?;
                let output = current.record.with_tenants(appended(&current.record.tenants, new_tenants));
                (vec![current], output)
            }
            Command::CancelRent { record_id, tenants_to_remove } => {
                let current = self.store.get_current(record_id)?;
                let remaining = current.record.tenants.iter().filter(|tenant| !tenants_to_remove.contains(tenant)).cloned().collect();
                let output = current.record.with_tenants(remaining);
                (vec![current], output)
            }
        };
        self.assemble(command.kind(), inputs, output)
    }

    fn assemble(&self, kind: CommandKind, inputs: Vec<RecordVersion>, output: Record) -> Result<SignedTransition, EstateError> {
        let required_signers = self.policy.required_signers(inputs.iter().map(|version| &version.record).chain(std::iter::once(&output)));
        let transition = Transition {
            kind,
            inputs,
            outputs: vec![output],
            required_signers,
            notary: self.notary.clone(),
            initiator: self.party.clone(),
            created_at_nanos: now_nanos(),
        };
        validate_proposal(&transition, self.policy)?;
        let signed = SignedTransition::new(transition)?;
        debug!(
            "proposal assembled party={} kind={} transition_id={} required_signers={}",
            self.party,
            kind,
            signed.id.short(),
            signed.transition.required_signers.len()
        );
        Ok(signed)
    }
}

/// Keeps the first occurrence of each party, in order.
fn dedup(parties: &[PartyId]) -> Vec<PartyId> {
    let mut seen = HashSet::new();
    parties.iter().filter(|party| seen.insert(*party)).cloned().collect()
}

/// `existing` followed by the parties of `added` it does not already contain.
fn appended(existing: &[PartyId], added: &[PartyId]) -> Vec<PartyId> {
    let mut tenants = existing.to_vec();
    for party in dedup(added) {
        if !tenants.contains(&party) {
            tenants.push(party);
        }
    }
    tenants
}
