use crate::application::lifecycle::LifecycleObserver;
use crate::domain::coordination::InitiatorPhase;
use crate::domain::hashes::{session_id, signing_payload};
use crate::domain::{SignedTransition, TransactionSignature};
use crate::foundation::{EstateError, PartyId, TransitionId};
use crate::infrastructure::config::CoordinationConfig;
use crate::infrastructure::keys::SigningService;
use crate::infrastructure::transport::{FlowSession, SessionMessage, SessionTransport};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// A fully signed transition plus the open session to every counterparty that signed it.
pub struct CollectedSignatures {
    pub signed: SignedTransition,
    pub sessions: Vec<Box<dyn FlowSession>>,
}

/// Initiator side of signature collection.
pub struct SigningCoordinator {
    party: PartyId,
    transport: Arc<dyn SessionTransport>,
    signing: Arc<dyn SigningService>,
    observer: Arc<dyn LifecycleObserver>,
    session_open_timeout: Duration,
    signature_timeout: Duration,
}

impl SigningCoordinator {
    pub fn new(
        party: PartyId,
        transport: Arc<dyn SessionTransport>,
        signing: Arc<dyn SigningService>,
        observer: Arc<dyn LifecycleObserver>,
        config: &CoordinationConfig,
    ) -> Self {
        Self {
            party,
            transport,
            signing,
            observer,
            session_open_timeout: config.session_open_timeout(),
            signature_timeout: config.signature_timeout(),
        }
    }

    /// Signs `signed` as the initiator, then asks every other required signer in parallel.
    ///
    /// Succeeds only when every counterparty returned a valid signature. The first failure
    /// cancels the outstanding waits and sends `Abort` on the sessions that already answered.
    pub async fn collect(&self, mut signed: SignedTransition) -> Result<CollectedSignatures, EstateError> {
        let mut phase = InitiatorPhase::Built;
        let transition_id = signed.id;
        let own_signature = self.signing.sign(&signing_payload(&transition_id), &self.party)?;
        signed.add_signature(TransactionSignature { signer: self.party.clone(), signature: own_signature });

        let counterparties = signed.transition.counterparties(&self.party);
        if counterparties.is_empty() {
            phase.advance(InitiatorPhase::FullySigned)?;
            self.observer.on_fully_signed(&transition_id, signed.signatures.len());
            return Ok(CollectedSignatures { signed, sessions: Vec::new() });
        }

        phase.advance(InitiatorPhase::AwaitingSignatures)?;
        info!("collecting signatures transition_id={} counterparties={}", transition_id.short(), counterparties.len());

        let mut pending = JoinSet::new();
        for counterparty in counterparties {
            let request = SignatureRequest {
                initiator: self.party.clone(),
                counterparty,
                proposal: signed.clone(),
                transport: Arc::clone(&self.transport),
                signing: Arc::clone(&self.signing),
                session_open_timeout: self.session_open_timeout,
                signature_timeout: self.signature_timeout,
            };
            pending.spawn(request.run());
        }

        let mut sessions = Vec::new();
        while let Some(joined) = pending.join_next().await {
            let outcome = joined.map_err(|err| EstateError::TaskFailed { task: "signature request".to_string(), details: err.to_string() });
            match outcome.and_then(|result| result) {
                Ok((session, signature)) => {
                    debug!("signature collected transition_id={} signer={}", transition_id.short(), signature.signer);
                    self.observer.on_signature_received(&transition_id, &signature.signer);
                    signed.add_signature(signature);
                    sessions.push(session);
                }
                Err(err) => {
                    pending.abort_all();
                    return self.fail(&mut phase, &transition_id, &mut sessions, err).await;
                }
            }
        }

        if !signed.is_fully_signed() {
            let err = EstateError::IncompleteSignatures { transition_id, missing: signed.missing_signers() };
            return self.fail(&mut phase, &transition_id, &mut sessions, err).await;
        }
        phase.advance(InitiatorPhase::FullySigned)?;
        self.observer.on_fully_signed(&transition_id, signed.signatures.len());
        Ok(CollectedSignatures { signed, sessions })
    }

    async fn fail<T>(
        &self,
        phase: &mut InitiatorPhase,
        transition_id: &TransitionId,
        sessions: &mut [Box<dyn FlowSession>],
        err: EstateError,
    ) -> Result<T, EstateError> {
        phase.advance(InitiatorPhase::Failed)?;
        warn!("signature collection failed transition_id={} error={}", transition_id.short(), err);
        abort_sessions(sessions, &err.to_string()).await;
        self.observer.on_failed(Some(transition_id), &err.to_string());
        Err(err)
    }
}

/// Tells every session in `sessions` to discard the proposal. Delivery failures are only logged.
pub(crate) async fn abort_sessions(sessions: &mut [Box<dyn FlowSession>], reason: &str) {
    for session in sessions.iter_mut() {
        if let Err(err) = session.send(SessionMessage::Abort { reason: reason.to_string() }).await {
            debug!("abort not delivered counterparty={} error={}", session.counterparty(), err);
        }
    }
}

/// One counterparty's round trip, run as its own task.
struct SignatureRequest {
    initiator: PartyId,
    counterparty: PartyId,
    proposal: SignedTransition,
    transport: Arc<dyn SessionTransport>,
    signing: Arc<dyn SigningService>,
    session_open_timeout: Duration,
    signature_timeout: Duration,
}

impl SignatureRequest {
    async fn run(self) -> Result<(Box<dyn FlowSession>, TransactionSignature), EstateError> {
        let session_id = session_id(&self.proposal.id, &self.initiator, &self.counterparty);
        let mut session = tokio::time::timeout(self.session_open_timeout, self.transport.open_session(&self.counterparty, session_id))
            .await
            .map_err(|_| EstateError::timeout(format!("open_session with {}", self.counterparty), millis(self.session_open_timeout)))??;

        session.send(SessionMessage::Proposal(self.proposal.clone())).await?;

        let reply = tokio::time::timeout(self.signature_timeout, session.receive())
            .await
            .map_err(|_| EstateError::timeout(format!("signature from {}", self.counterparty), millis(self.signature_timeout)))??;

        match reply {
            SessionMessage::Signature(signature) => {
                if signature.signer != self.counterparty {
                    return Err(EstateError::protocol(&self.counterparty, format!("signature labelled as {}", signature.signer)));
                }
                if !self.signing.verify(&signing_payload(&self.proposal.id), &signature.signature, &self.counterparty) {
                    return Err(EstateError::SignatureInvalid { party: self.counterparty.clone() });
                }
                Ok((session, signature))
            }
            SessionMessage::Rejected { reason } => Err(EstateError::SignerRejected { party: self.counterparty.clone(), reason }),
            other => Err(EstateError::protocol(&self.counterparty, format!("expected signature, got {}", other.kind()))),
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
