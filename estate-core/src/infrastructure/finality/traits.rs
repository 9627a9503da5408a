use crate::domain::{FinalizedTransition, SignedTransition, StateRef};
use crate::foundation::{EstateError, PartyId};
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub enum FinalityOutcome {
    Accepted(FinalizedTransition),
    /// Typically: an input was already consumed by another transition.
    Rejected { reason: String },
}

/// The uniqueness authority: accepts at most one transition per consumed version.
#[async_trait]
pub trait FinalityService: Send + Sync {
    fn identity(&self) -> &PartyId;

    async fn submit(&self, signed: &SignedTransition, consumed: &[StateRef]) -> Result<FinalityOutcome, EstateError>;
}
