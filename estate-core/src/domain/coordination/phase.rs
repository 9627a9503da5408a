use crate::foundation::EstateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one proposal at the party that started it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InitiatorPhase {
    #[default]
    Built = 0,
    AwaitingSignatures = 1,
    FullySigned = 2,
    Finalized = 3,
    Failed = 4,
}

impl InitiatorPhase {
    pub fn can_transition_to(self, target: InitiatorPhase) -> bool {
        use InitiatorPhase::*;
        matches!(
            (self, target),
            (Built, AwaitingSignatures)
                | (Built, FullySigned)
                | (Built, Failed)
                | (AwaitingSignatures, FullySigned)
                | (AwaitingSignatures, Failed)
                | (FullySigned, Finalized)
                | (FullySigned, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InitiatorPhase::Finalized | InitiatorPhase::Failed)
    }

    pub fn advance(&mut self, target: InitiatorPhase) -> Result<(), EstateError> {
        advance(self, target, Self::can_transition_to)
    }
}

/// Progress of one proposal at a counterparty asked to sign it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponderPhase {
    #[default]
    AwaitingProposal = 0,
    Validating = 1,
    Signed = 2,
    Finalized = 3,
    Aborted = 4,
}

impl ResponderPhase {
    pub fn can_transition_to(self, target: ResponderPhase) -> bool {
        use ResponderPhase::*;
        matches!(
            (self, target),
            (AwaitingProposal, Validating)
                | (AwaitingProposal, Aborted)
                | (Validating, Signed)
                | (Validating, Aborted)
                | (Signed, Finalized)
                | (Signed, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ResponderPhase::Finalized | ResponderPhase::Aborted)
    }

    pub fn advance(&mut self, target: ResponderPhase) -> Result<(), EstateError> {
        advance(self, target, Self::can_transition_to)
    }
}

fn advance<P: Copy + fmt::Debug>(current: &mut P, target: P, allowed: fn(P, P) -> bool) -> Result<(), EstateError> {
    if !allowed(*current, target) {
        return Err(EstateError::InvalidPhaseTransition { from: format!("{:?}", current), to: format!("{:?}", target) });
    }
    *current = target;
    Ok(())
}
