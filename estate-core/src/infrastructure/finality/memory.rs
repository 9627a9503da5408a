use crate::domain::hashes::{finality_payload, signing_payload};
use crate::domain::{FinalizedTransition, SignedTransition, StateRef};
use crate::foundation::{now_nanos, EstateError, PartyId, TransitionId};
use crate::infrastructure::finality::{FinalityOutcome, FinalityService};
use crate::infrastructure::keys::{Ed25519Identity, KeyDirectory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct NotaryState {
    /// Versions this notary has seen produced and not yet consumed.
    unspent: HashSet<StateRef>,
    /// Consumed version -> the transition that consumed it.
    consumed: HashMap<StateRef, TransitionId>,
    finalized: HashSet<TransitionId>,
}

/// Single-process finality service. Checks and commits under one lock, so two transitions
/// spending the same version can never both be accepted.
pub struct InMemoryNotary {
    identity: Ed25519Identity,
    directory: Arc<KeyDirectory>,
    state: Mutex<NotaryState>,
    response_delay: Mutex<Option<Duration>>,
}

impl InMemoryNotary {
    /// Publishes the notary's key in `directory` so participants can check its countersignature.
    pub fn new(identity: Ed25519Identity, directory: Arc<KeyDirectory>) -> Result<Self, EstateError> {
        directory.register(identity.party.clone(), identity.verifying_key())?;
        Ok(Self { identity, directory, state: Mutex::new(NotaryState::default()), response_delay: Mutex::new(None) })
    }

    /// Holds every later response back by `delay`; `None` answers immediately.
    pub fn set_response_delay(&self, delay: Option<Duration>) -> Result<(), EstateError> {
        *self.response_delay.lock().map_err(|_| crate::storage_err!("notary delay lock", "poisoned"))? = delay;
        Ok(())
    }

    pub fn consumed_by(&self, state_ref: &StateRef) -> Result<Option<TransitionId>, EstateError> {
        Ok(self.lock_state()?.consumed.get(state_ref).copied())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, NotaryState>, EstateError> {
        self.state.lock().map_err(|_| crate::storage_err!("notary state lock", "poisoned"))
    }

    /// Everything that does not depend on the ledger: addressing, integrity, signatures.
    fn check_request(&self, signed: &SignedTransition, consumed: &[StateRef]) -> Result<(), String> {
        let transition = &signed.transition;
        if transition.notary != self.identity.party {
            return Err(format!("transition names notary {} but was sent to {}", transition.notary, self.identity.party));
        }
        signed.verify_id().map_err(|err| err.to_string())?;
        let declared: HashSet<StateRef> = transition.consumed_refs().into_iter().collect();
        let requested: HashSet<StateRef> = consumed.iter().copied().collect();
        if declared != requested || declared.len() != consumed.len() {
            return Err("consumed versions do not match the transition inputs".to_string());
        }
        let payload = signing_payload(&signed.id);
        for signer in &transition.required_signers {
            match signed.signature_of(signer) {
                None => return Err(format!("missing signature from {signer}")),
                Some(signature) if !self.directory.verify(signer, &payload, signature) => {
                    return Err(format!("invalid signature from {signer}"));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FinalityService for InMemoryNotary {
    fn identity(&self) -> &PartyId {
        &self.identity.party
    }

    async fn submit(&self, signed: &SignedTransition, consumed: &[StateRef]) -> Result<FinalityOutcome, EstateError> {
        let delay = *self.response_delay.lock().map_err(|_| crate::storage_err!("notary delay lock", "poisoned"))?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Err(reason) = self.check_request(signed, consumed) {
            warn!("notary rejected transition_id={} reason={}", signed.id.short(), reason);
            return Ok(FinalityOutcome::Rejected { reason });
        }

        let transition_id = signed.id;
        {
            let mut state = self.lock_state()?;
            if state.finalized.contains(&transition_id) {
                info!("notary rejected replay transition_id={}", transition_id.short());
                return Ok(FinalityOutcome::Rejected { reason: format!("transition {} already finalized", transition_id.short()) });
            }
            for state_ref in consumed {
                if let Some(spender) = state.consumed.get(state_ref) {
                    info!("notary rejected double spend transition_id={} input={} spent_by={}", transition_id.short(), state_ref, spender.short());
                    return Ok(FinalityOutcome::Rejected { reason: format!("input {state_ref} already consumed by {}", spender.short()) });
                }
                if !state.unspent.contains(state_ref) {
                    return Ok(FinalityOutcome::Rejected { reason: format!("input {state_ref} is unknown to the notary") });
                }
            }
            for state_ref in consumed {
                state.unspent.remove(state_ref);
                state.consumed.insert(*state_ref, transition_id);
            }
            for version in signed.transition.output_versions(transition_id) {
                state.unspent.insert(version.state_ref);
            }
            state.finalized.insert(transition_id);
        }

        let notary_signature = self.identity.sign_payload(&finality_payload(&transition_id, &self.identity.party));
        debug!("notary accepted transition_id={} inputs={}", transition_id.short(), consumed.len());
        Ok(FinalityOutcome::Accepted(FinalizedTransition { signed: signed.clone(), notary_signature, finalized_at_nanos: now_nanos() }))
    }
}
