use crate::application::lifecycle::LifecycleObserver;
use crate::application::signing::{abort_sessions, millis, CollectedSignatures};
use crate::domain::coordination::InitiatorPhase;
use crate::domain::hashes::{finality_payload, signing_payload};
use crate::domain::{FinalizedTransition, SignedTransition};
use crate::foundation::{EstateError, PartyId};
use crate::infrastructure::finality::{FinalityOutcome, FinalityService};
use crate::infrastructure::keys::SigningService;
use crate::infrastructure::storage::RecordStore;
use crate::infrastructure::transport::{FlowSession, SessionMessage};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Submits fully signed transitions to the finality service and distributes the result.
pub struct FinalityCoordinator {
    finality: Arc<dyn FinalityService>,
    signing: Arc<dyn SigningService>,
    store: Arc<dyn RecordStore>,
    observer: Arc<dyn LifecycleObserver>,
    finality_timeout: Duration,
    /// How long to wait for each counterparty to confirm it recorded the result.
    ack_timeout: Duration,
}

impl FinalityCoordinator {
    pub fn new(
        finality: Arc<dyn FinalityService>,
        signing: Arc<dyn SigningService>,
        store: Arc<dyn RecordStore>,
        observer: Arc<dyn LifecycleObserver>,
        finality_timeout: Duration,
        ack_timeout: Duration,
    ) -> Self {
        Self { finality, signing, store, observer, finality_timeout, ack_timeout }
    }

    /// On acceptance the result is recorded locally and sent on every session. On rejection or
    /// timeout every session is told to abort and nothing is recorded anywhere.
    ///
    /// Once accepted the transition is final, so a local store failure or a counterparty that
    /// never confirms does not stop delivery to the others. Those parties are reported together
    /// as `CommittedNotRecorded`.
    pub async fn finalize(&self, collected: CollectedSignatures) -> Result<FinalizedTransition, EstateError> {
        let CollectedSignatures { signed, mut sessions } = collected;
        let transition_id = signed.id;
        let mut phase = InitiatorPhase::FullySigned;

        let accepted = match self.submit(&signed).await {
            Ok(FinalityOutcome::Accepted(finalized)) => self.check_finalized(&signed, &finalized).map(|()| finalized),
            Ok(FinalityOutcome::Rejected { reason }) => Err(EstateError::FinalityRejected { reason }),
            Err(err) => Err(err),
        };
        let finalized = match accepted {
            Ok(finalized) => finalized,
            Err(err) => {
                phase.advance(InitiatorPhase::Failed)?;
                self.fail(&signed, &mut sessions, &err).await;
                return Err(err);
            }
        };

        phase.advance(InitiatorPhase::Finalized)?;
        info!("transition finalized transition_id={} counterparties={}", transition_id.short(), sessions.len());
        let mut unrecorded = Vec::new();
        if let Err(err) = self.store.mark_finalized(&finalized) {
            warn!("finalized transition not recorded locally transition_id={} error={}", transition_id.short(), err);
            unrecorded.push(signed.transition.initiator.clone());
        }
        unrecorded.extend(self.distribute(&finalized, sessions).await);
        for version in finalized.output_versions() {
            self.observer.on_finalized(&transition_id, &version);
        }
        if !unrecorded.is_empty() {
            return Err(EstateError::CommittedNotRecorded { transition_id, parties: unrecorded });
        }
        Ok(finalized)
    }

    async fn submit(&self, signed: &SignedTransition) -> Result<FinalityOutcome, EstateError> {
        self.verify_signatures(signed)?;
        let notary = self.finality.identity();
        if &signed.transition.notary != notary {
            return Err(EstateError::ConfigError(format!(
                "transition names notary {} but this node submits to {}",
                signed.transition.notary, notary
            )));
        }
        let consumed = signed.transition.consumed_refs();
        debug!("submitting to finality service transition_id={} notary={} inputs={}", signed.id.short(), notary, consumed.len());
        tokio::time::timeout(self.finality_timeout, self.finality.submit(signed, &consumed))
            .await
            .map_err(|_| EstateError::timeout("finality", millis(self.finality_timeout)))?
    }

    fn verify_signatures(&self, signed: &SignedTransition) -> Result<(), EstateError> {
        let payload = signing_payload(&signed.id);
        for signer in &signed.transition.required_signers {
            let valid = signed.signature_of(signer).map(|signature| self.signing.verify(&payload, signature, signer)).unwrap_or(false);
            if !valid {
                return Err(EstateError::SignatureInvalid { party: signer.clone() });
            }
        }
        Ok(())
    }

    fn check_finalized(&self, signed: &SignedTransition, finalized: &FinalizedTransition) -> Result<(), EstateError> {
        let notary = &signed.transition.notary;
        if !finalized.id().ct_eq(&signed.id) || finalized.signed.transition != signed.transition {
            return Err(EstateError::protocol(notary, "finalized transition differs from the one submitted"));
        }
        if !self.signing.verify(&finality_payload(&signed.id, notary), &finalized.notary_signature, notary) {
            return Err(EstateError::SignatureInvalid { party: notary.clone() });
        }
        Ok(())
    }

    async fn fail(&self, signed: &SignedTransition, sessions: &mut [Box<dyn FlowSession>], err: &EstateError) {
        warn!("finality failed transition_id={} error={}", signed.id.short(), err);
        abort_sessions(sessions, &err.to_string()).await;
        self.observer.on_failed(Some(&signed.id), &err.to_string());
    }

    /// Sends the result on every session and waits for each counterparty to confirm.
    /// Returns the counterparties that did not.
    async fn distribute(&self, finalized: &FinalizedTransition, sessions: Vec<Box<dyn FlowSession>>) -> Vec<PartyId> {
        let deliveries = sessions.into_iter().map(|mut session| {
            let message = SessionMessage::Finalized(finalized.clone());
            let ack_timeout = self.ack_timeout;
            async move {
                let counterparty = session.counterparty().clone();
                let result = async {
                    session.send(message).await?;
                    match tokio::time::timeout(ack_timeout, session.receive()).await {
                        Ok(Ok(SessionMessage::Recorded)) => Ok(()),
                        Ok(Ok(other)) => Err(EstateError::protocol(&counterparty, format!("expected recorded, got {}", other.kind()))),
                        Ok(Err(err)) => Err(err),
                        Err(_) => Err(EstateError::timeout(format!("record confirmation from {counterparty}"), millis(ack_timeout))),
                    }
                }
                .await;
                (counterparty, result)
            }
        });
        let mut unconfirmed = Vec::new();
        for (counterparty, result) in join_all(deliveries).await {
            if let Err(err) = result {
                warn!("finalized transition not confirmed transition_id={} counterparty={} error={}", finalized.id().short(), counterparty, err);
                unconfirmed.push(counterparty);
            }
        }
        unconfirmed
    }
}
