use crate::application::lifecycle::LifecycleObserver;
use crate::application::signing::millis;
use crate::domain::coordination::ResponderPhase;
use crate::domain::hashes::{finality_payload, session_id, signing_payload};
use crate::domain::validation::validate_proposal;
use crate::domain::{FinalizedTransition, SignedTransition, SignerPolicy, TransactionSignature, Transition};
use crate::foundation::{EstateError, PartyId, TransitionId};
use crate::infrastructure::keys::SigningService;
use crate::infrastructure::storage::RecordStore;
use crate::infrastructure::transport::{FlowSession, SessionMessage};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Extra acceptance rule a counterparty applies before signing, on top of the transition rules.
pub trait TransactionCheck: Send + Sync {
    fn check(&self, transition: &Transition) -> Result<(), String>;
}

/// Signs everything that passes the transition rules.
pub struct AcceptAll;

impl TransactionCheck for AcceptAll {
    fn check(&self, _transition: &Transition) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum ResponderOutcome {
    Recorded(FinalizedTransition),
    /// We declined to sign.
    Rejected { transition_id: Option<TransitionId>, reason: String },
    /// We signed, but the initiator gave up or went away.
    Aborted { transition_id: TransitionId, reason: String },
}

/// Counterparty side: validates a proposal independently, signs it, then records the result.
pub struct SignResponder {
    party: PartyId,
    policy: SignerPolicy,
    signing: Arc<dyn SigningService>,
    store: Arc<dyn RecordStore>,
    check: Arc<dyn TransactionCheck>,
    observer: Arc<dyn LifecycleObserver>,
    proposal_timeout: Duration,
    finality_timeout: Duration,
}

impl SignResponder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        party: PartyId,
        policy: SignerPolicy,
        signing: Arc<dyn SigningService>,
        store: Arc<dyn RecordStore>,
        check: Arc<dyn TransactionCheck>,
        observer: Arc<dyn LifecycleObserver>,
        proposal_timeout: Duration,
        finality_timeout: Duration,
    ) -> Self {
        Self { party, policy, signing, store, check, observer, proposal_timeout, finality_timeout }
    }

    pub async fn respond(&self, mut session: Box<dyn FlowSession>) -> Result<ResponderOutcome, EstateError> {
        let mut phase = ResponderPhase::AwaitingProposal;
        let initiator = session.counterparty().clone();

        let first = tokio::time::timeout(self.proposal_timeout, session.receive())
            .await
            .map_err(|_| EstateError::timeout(format!("proposal from {initiator}"), millis(self.proposal_timeout)))??;
        let proposal = match first {
            SessionMessage::Proposal(proposal) => proposal,
            SessionMessage::Abort { reason } => {
                phase.advance(ResponderPhase::Aborted)?;
                return Err(EstateError::protocol(&initiator, format!("aborted before proposing: {reason}")));
            }
            other => return Err(EstateError::protocol(&initiator, format!("expected proposal, got {}", other.kind()))),
        };
        phase.advance(ResponderPhase::Validating)?;
        let transition_id = proposal.id;

        if let Err(reason) = self.vet(&proposal, &initiator, session.session_id()) {
            phase.advance(ResponderPhase::Aborted)?;
            warn!("declining proposal party={} initiator={} transition_id={} reason={}", self.party, initiator, transition_id.short(), reason);
            self.observer.on_failed(Some(&transition_id), &reason);
            session.send(SessionMessage::Rejected { reason: reason.clone() }).await?;
            return Ok(ResponderOutcome::Rejected { transition_id: Some(transition_id), reason });
        }

        let signature = self.signing.sign(&signing_payload(&transition_id), &self.party)?;
        session.send(SessionMessage::Signature(TransactionSignature { signer: self.party.clone(), signature })).await?;
        phase.advance(ResponderPhase::Signed)?;
        self.observer.on_proposal_signed(&transition_id, &initiator);
        debug!("proposal signed party={} transition_id={}", self.party, transition_id.short());

        let next = match tokio::time::timeout(self.finality_timeout, session.receive()).await {
            Err(_) => {
                phase.advance(ResponderPhase::Aborted)?;
                return Err(EstateError::timeout(format!("finalized transition from {initiator}"), millis(self.finality_timeout)));
            }
            Ok(Err(EstateError::TransportError { details, .. })) => {
                phase.advance(ResponderPhase::Aborted)?;
                return Ok(ResponderOutcome::Aborted { transition_id, reason: details });
            }
            Ok(result) => result?,
        };

        match next {
            SessionMessage::Finalized(finalized) => {
                self.check_finalized(&proposal, &finalized)?;
                let fresh = self.store.mark_finalized(&finalized)?;
                phase.advance(ResponderPhase::Finalized)?;
                info!("recorded finalized transition party={} transition_id={} fresh={}", self.party, transition_id.short(), fresh);
                for version in finalized.output_versions() {
                    self.observer.on_finalized(&transition_id, &version);
                }
                if let Err(err) = session.send(SessionMessage::Recorded).await {
                    debug!("record confirmation not delivered party={} error={}", self.party, err);
                }
                Ok(ResponderOutcome::Recorded(finalized))
            }
            SessionMessage::Abort { reason } => {
                phase.advance(ResponderPhase::Aborted)?;
                info!("initiator aborted party={} transition_id={} reason={}", self.party, transition_id.short(), reason);
                Ok(ResponderOutcome::Aborted { transition_id, reason })
            }
            other => Err(EstateError::protocol(&initiator, format!("expected finalized transition, got {}", other.kind()))),
        }
    }

    /// Every reason not to sign, checked without trusting anything the initiator computed.
    fn vet(&self, proposal: &SignedTransition, initiator: &PartyId, session: crate::foundation::SessionId) -> Result<(), String> {
        proposal.verify_id().map_err(|err| err.to_string())?;
        let transition = &proposal.transition;
        if &transition.initiator != initiator {
            return Err(format!("proposal names initiator {} but came from {}", transition.initiator, initiator));
        }
        if !session_id(&proposal.id, initiator, &self.party).ct_eq(&session) {
            return Err("session is not bound to this transition".to_string());
        }
        if !transition.required_signers.contains(&self.party) {
            return Err(format!("{} is not a required signer", self.party));
        }
        let initiator_signature = proposal.signature_of(initiator).ok_or_else(|| format!("missing signature from initiator {initiator}"))?;
        if !self.signing.verify(&signing_payload(&proposal.id), initiator_signature, initiator) {
            return Err(format!("invalid signature from initiator {initiator}"));
        }
        validate_proposal(transition, self.policy).map_err(|violations| format!("validation failed: {violations}"))?;
        self.check.check(transition)
    }

    fn check_finalized(&self, proposal: &SignedTransition, finalized: &FinalizedTransition) -> Result<(), EstateError> {
        let notary = &proposal.transition.notary;
        if !finalized.id().ct_eq(&proposal.id) {
            return Err(EstateError::protocol(notary, format!("expected transition {}, got {}", proposal.id.short(), finalized.id().short())));
        }
        finalized.signed.verify_id()?;
        if !self.signing.verify(&finality_payload(&proposal.id, notary), &finalized.notary_signature, notary) {
            return Err(EstateError::SignatureInvalid { party: notary.clone() });
        }
        let payload = signing_payload(&proposal.id);
        for signer in &finalized.signed.transition.required_signers {
            let valid = finalized.signed.signature_of(signer).map(|signature| self.signing.verify(&payload, signature, signer)).unwrap_or(false);
            if !valid {
                return Err(EstateError::SignatureInvalid { party: signer.clone() });
            }
        }
        Ok(())
    }
}
