use crate::domain::hashes::transition_id;
use crate::domain::{CommandKind, Record, RecordVersion, StateRef};
use crate::foundation::{EstateError, PartyId, TransitionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A proposed change: the versions it consumes, the records it produces, and who must agree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: CommandKind,
    pub inputs: Vec<RecordVersion>,
    pub outputs: Vec<Record>,
    pub required_signers: BTreeSet<PartyId>,
    /// Finality service that must countersign this transition.
    pub notary: PartyId,
    pub initiator: PartyId,
    pub created_at_nanos: u64,
}

impl Transition {
    pub fn id(&self) -> Result<TransitionId, EstateError> {
        transition_id(self)
    }

    pub fn input_records(&self) -> Vec<Record> {
        self.inputs.iter().map(|version| version.record.clone()).collect()
    }

    pub fn consumed_refs(&self) -> Vec<StateRef> {
        self.inputs.iter().map(|version| version.state_ref).collect()
    }

    /// Required signers other than `party`, in stable order.
    pub fn counterparties(&self, party: &PartyId) -> Vec<PartyId> {
        self.required_signers.iter().filter(|signer| *signer != party).cloned().collect()
    }

    /// Versions this transition commits once finalized under `id`.
    pub fn output_versions(&self, id: TransitionId) -> Vec<RecordVersion> {
        self.outputs
            .iter()
            .map(|record| {
                let sequence = self
                    .inputs
                    .iter()
                    .find(|input| input.record_id() == record.record_id)
                    .map(|input| input.sequence.saturating_add(1))
                    .unwrap_or(0);
                RecordVersion { state_ref: StateRef { record_id: record.record_id, transition_id: id }, sequence, record: record.clone() }
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub signer: PartyId,
    pub signature: Vec<u8>,
}

/// A transition plus the participant signatures gathered so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransition {
    pub id: TransitionId,
    pub transition: Transition,
    pub signatures: BTreeMap<PartyId, Vec<u8>>,
}

impl SignedTransition {
    pub fn new(transition: Transition) -> Result<Self, EstateError> {
        let id = transition.id()?;
        Ok(Self { id, transition, signatures: BTreeMap::new() })
    }

    /// Recomputes the id from content; a received proposal must not be trusted on its claimed id.
    pub fn verify_id(&self) -> Result<(), EstateError> {
        let computed = self.transition.id()?;
        if !computed.ct_eq(&self.id) {
            return Err(EstateError::TransitionIdMismatch { claimed: self.id, computed });
        }
        Ok(())
    }

    pub fn add_signature(&mut self, signature: TransactionSignature) {
        self.signatures.insert(signature.signer, signature.signature);
    }

    pub fn signature_of(&self, party: &PartyId) -> Option<&[u8]> {
        self.signatures.get(party).map(Vec::as_slice)
    }

    pub fn missing_signers(&self) -> Vec<PartyId> {
        self.transition.required_signers.iter().filter(|signer| !self.signatures.contains_key(*signer)).cloned().collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.missing_signers().is_empty()
    }
}

/// A signed transition the finality service accepted and countersigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTransition {
    pub signed: SignedTransition,
    pub notary_signature: Vec<u8>,
    pub finalized_at_nanos: u64,
}

impl FinalizedTransition {
    pub fn id(&self) -> TransitionId {
        self.signed.id
    }

    pub fn notary(&self) -> &PartyId {
        &self.signed.transition.notary
    }

    pub fn output_versions(&self) -> Vec<RecordVersion> {
        self.signed.transition.output_versions(self.signed.id)
    }
}
