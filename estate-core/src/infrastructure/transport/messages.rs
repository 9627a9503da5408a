use crate::domain::{FinalizedTransition, SignedTransition, TransactionSignature};
use crate::foundation::{PartyId, PayloadHash, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageEnvelope {
    pub session_id: SessionId,
    pub sender: PartyId,
    /// Starts at 1 per session and direction.
    pub seq_no: u64,
    pub payload_hash: PayloadHash,
    pub payload: SessionMessage,
}

/// Everything exchanged on one signing session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum SessionMessage {
    /// Initiator -> counterparty: the transition, already carrying the initiator's signature.
    Proposal(SignedTransition),
    /// Counterparty -> initiator.
    Signature(TransactionSignature),
    /// Counterparty -> initiator: declined to sign.
    Rejected { reason: String },
    /// Initiator -> counterparty: the notarised result.
    Finalized(FinalizedTransition),
    /// Initiator -> counterparty: the attempt failed; discard the proposal.
    Abort { reason: String },
    /// Counterparty -> initiator: the finalized transition is in the counterparty's store.
    Recorded,
}

impl SessionMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionMessage::Proposal(_) => "proposal",
            SessionMessage::Signature(_) => "signature",
            SessionMessage::Rejected { .. } => "rejected",
            SessionMessage::Finalized(_) => "finalized",
            SessionMessage::Abort { .. } => "abort",
            SessionMessage::Recorded => "recorded",
        }
    }
}
