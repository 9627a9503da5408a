use crate::domain::{CommandKind, RecordVersion};
use crate::foundation::{PartyId, TransitionId};
use log::{debug, info, trace, warn};
use std::sync::Arc;

/// Progress notifications for one transition, from both sides of the protocol.
pub trait LifecycleObserver: Send + Sync {
    fn on_proposal_built(&self, _transition_id: &TransitionId, _kind: CommandKind, _required_signers: usize) {}
    fn on_signature_received(&self, _transition_id: &TransitionId, _signer: &PartyId) {}
    fn on_fully_signed(&self, _transition_id: &TransitionId, _signature_count: usize) {}
    /// A counterparty signed a proposal it was sent.
    fn on_proposal_signed(&self, _transition_id: &TransitionId, _initiator: &PartyId) {}
    fn on_finalized(&self, _transition_id: &TransitionId, _version: &RecordVersion) {}
    fn on_failed(&self, _transition_id: Option<&TransitionId>, _reason: &str) {}
}

pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

/// Writes every notification to the log.
pub struct LoggingObserver {
    party: PartyId,
}

impl LoggingObserver {
    pub fn new(party: PartyId) -> Self {
        Self { party }
    }
}

impl LifecycleObserver for LoggingObserver {
    fn on_proposal_built(&self, transition_id: &TransitionId, kind: CommandKind, required_signers: usize) {
        info!("proposal built party={} transition_id={} kind={} required_signers={}", self.party, transition_id.short(), kind, required_signers);
    }

    fn on_signature_received(&self, transition_id: &TransitionId, signer: &PartyId) {
        debug!("signature received party={} transition_id={} signer={}", self.party, transition_id.short(), signer);
    }

    fn on_fully_signed(&self, transition_id: &TransitionId, signature_count: usize) {
        info!("transition fully signed party={} transition_id={} signature_count={}", self.party, transition_id.short(), signature_count);
    }

    fn on_proposal_signed(&self, transition_id: &TransitionId, initiator: &PartyId) {
        info!("signed proposal party={} transition_id={} initiator={}", self.party, transition_id.short(), initiator);
    }

    fn on_finalized(&self, transition_id: &TransitionId, version: &RecordVersion) {
        info!(
            "transition finalized party={} transition_id={} record_id={} sequence={}",
            self.party,
            transition_id.short(),
            version.record_id(),
            version.sequence
        );
    }

    fn on_failed(&self, transition_id: Option<&TransitionId>, reason: &str) {
        let transition_id = transition_id.map(TransitionId::short).unwrap_or_else(|| "-".to_string());
        warn!("transition failed party={} transition_id={} reason={}", self.party, transition_id, reason);
    }
}

#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    fn each(&self, event: &str, f: impl Fn(&dyn LifecycleObserver)) {
        trace!("{} dispatch observer_count={}", event, self.observers.len());
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }
}

impl LifecycleObserver for CompositeObserver {
    fn on_proposal_built(&self, transition_id: &TransitionId, kind: CommandKind, required_signers: usize) {
        self.each("on_proposal_built", |observer| observer.on_proposal_built(transition_id, kind, required_signers));
    }

    fn on_signature_received(&self, transition_id: &TransitionId, signer: &PartyId) {
        self.each("on_signature_received", |observer| observer.on_signature_received(transition_id, signer));
    }

    fn on_fully_signed(&self, transition_id: &TransitionId, signature_count: usize) {
        self.each("on_fully_signed", |observer| observer.on_fully_signed(transition_id, signature_count));
    }

    fn on_proposal_signed(&self, transition_id: &TransitionId, initiator: &PartyId) {
        self.each("on_proposal_signed", |observer| observer.on_proposal_signed(transition_id, initiator));
    }

    fn on_finalized(&self, transition_id: &TransitionId, version: &RecordVersion) {
        self.each("on_finalized", |observer| observer.on_finalized(transition_id, version));
    }

    fn on_failed(&self, transition_id: Option<&TransitionId>, reason: &str) {
        self.each("on_failed", |observer| observer.on_failed(transition_id, reason));
    }
}
