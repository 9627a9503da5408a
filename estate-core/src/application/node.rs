use crate::application::builder::ProposalBuilder;
use crate::application::finality::FinalityCoordinator;
use crate::application::lifecycle::{CompositeObserver, LifecycleObserver, LoggingObserver};
use crate::application::locks::{RecordLockGuard, RecordLocks};
use crate::application::responder::{AcceptAll, ResponderOutcome, SignResponder, TransactionCheck};
use crate::application::signing::SigningCoordinator;
use crate::domain::{Command, RecordVersion};
use crate::foundation::{EstateError, PartyId, RecordId};
use crate::infrastructure::config::CoordinationConfig;
use crate::infrastructure::finality::FinalityService;
use crate::infrastructure::keys::SigningService;
use crate::infrastructure::storage::RecordStore;
use crate::infrastructure::transport::{FlowSession, SessionTransport};
use log::{debug, info, warn};
use std::sync::Arc;

/// External collaborators a node is wired to.
#[derive(Clone)]
pub struct NodeServices {
    pub store: Arc<dyn RecordStore>,
    pub signing: Arc<dyn SigningService>,
    pub transport: Arc<dyn SessionTransport>,
    pub finality: Arc<dyn FinalityService>,
}

/// Optional hooks. Lifecycle events are always logged; `observer` receives them as well.
/// Without a `check` every valid proposal is signed.
#[derive(Clone, Default)]
pub struct NodeHooks {
    pub observer: Option<Arc<dyn LifecycleObserver>>,
    pub check: Option<Arc<dyn TransactionCheck>>,
}

/// One party: the command surface plus the responder that signs for it.
pub struct PropertyNode {
    party: PartyId,
    builder: ProposalBuilder,
    signing: SigningCoordinator,
    finality: FinalityCoordinator,
    responder: SignResponder,
    locks: RecordLocks,
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn SessionTransport>,
    observer: Arc<dyn LifecycleObserver>,
}

impl PropertyNode {
    pub fn new(party: PartyId, notary: PartyId, config: &CoordinationConfig, services: NodeServices) -> Self {
        Self::with_hooks(party, notary, config, services, NodeHooks::default())
    }

    pub fn with_hooks(party: PartyId, notary: PartyId, config: &CoordinationConfig, services: NodeServices, hooks: NodeHooks) -> Self {
        let mut composite = CompositeObserver::new();
        composite.add_observer(Arc::new(LoggingObserver::new(party.clone())));
        if let Some(extra) = hooks.observer {
            composite.add_observer(extra);
        }
        let observer: Arc<dyn LifecycleObserver> = Arc::new(composite);
        let check = hooks.check.unwrap_or_else(|| Arc::new(AcceptAll));
        let NodeServices { store, signing, transport, finality } = services;

        let builder = ProposalBuilder::new(party.clone(), notary, config.signer_policy, Arc::clone(&store));
        let signing_coordinator =
            SigningCoordinator::new(party.clone(), Arc::clone(&transport), Arc::clone(&signing), Arc::clone(&observer), config);
        let finality_coordinator = FinalityCoordinator::new(
            finality,
            Arc::clone(&signing),
            Arc::clone(&store),
            Arc::clone(&observer),
            config.finality_timeout(),
            config.ack_timeout(),
        );
        let responder = SignResponder::new(
            party.clone(),
            config.signer_policy,
            signing,
            Arc::clone(&store),
            check,
            Arc::clone(&observer),
            config.signature_timeout(),
            config.finalized_wait(),
        );

        Self {
            party,
            builder,
            signing: signing_coordinator,
            finality: finality_coordinator,
            responder,
            locks: RecordLocks::new(),
            store,
            transport,
            observer,
        }
    }

    pub fn party(&self) -> &PartyId {
        &self.party
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn locks(&self) -> &RecordLocks {
        &self.locks
    }

    pub async fn create(&self, owners: Vec<PartyId>, tenants: Vec<PartyId>, area: i64, address: impl Into<String>) -> Result<RecordVersion, EstateError> {
        self.execute(Command::Create { owners, tenants, area, address: address.into() }).await
    }

    pub async fn sell(&self, record_id: RecordId, new_owners: Vec<PartyId>) -> Result<RecordVersion, EstateError> {
        self.execute(Command::Sell { record_id, new_owners }).await
    }

    pub async fn rent(&self, record_id: RecordId, new_tenants: Vec<PartyId>) -> Result<RecordVersion, EstateError> {
        self.execute(Command::Rent { record_id, new_tenants }).await
    }

    pub async fn cancel_rent(&self, record_id: RecordId, tenants_to_remove: Vec<PartyId>) -> Result<RecordVersion, EstateError> {
        self.execute(Command::CancelRent { record_id, tenants_to_remove }).await
    }

    /// Runs one attempt end to end: build and validate, collect signatures, finalize.
    ///
    /// The consumed record stays locked on this node until the attempt resolves either way.
    pub async fn execute(&self, command: Command) -> Result<RecordVersion, EstateError> {
        let kind = command.kind();
        let _guard: Option<RecordLockGuard> = command.record_id().map(|record_id| self.locks.try_acquire(record_id)).transpose()?;

        let signed = match self.builder.build(&command) {
            Ok(signed) => signed,
            Err(err) => {
                info!("proposal not built party={} kind={} error={}", self.party, kind, err);
                self.observer.on_failed(None, &err.to_string());
                return Err(err);
            }
        };
        let transition_id = signed.id;
        self.observer.on_proposal_built(&transition_id, kind, signed.transition.required_signers.len());

        let collected = self.signing.collect(signed).await?;
        let finalized = self.finality.finalize(collected).await?;
        let version = finalized
            .output_versions()
            .into_iter()
            .next()
            .ok_or_else(|| EstateError::UnexpectedOutcome {
                operation: kind.to_string(),
                details: format!("transition {} produced no output", transition_id.short()),
            })?;
        info!(
            "command completed party={} kind={} record_id={} sequence={} transition_id={}",
            self.party,
            kind,
            version.record_id(),
            version.sequence,
            transition_id.short()
        );
        Ok(version)
    }

    /// Handles one session another party opened with us.
    pub async fn handle_session(&self, session: Box<dyn FlowSession>) -> Result<ResponderOutcome, EstateError> {
        self.responder.respond(session).await
    }

    /// Accepts sessions until the transport closes, answering each on its own task.
    pub async fn serve(self: Arc<Self>) -> Result<(), EstateError> {
        info!("responder started party={}", self.party);
        loop {
            let session = self.transport.accept().await?;
            let node = Arc::clone(&self);
            tokio::spawn(async move {
                let counterparty = session.counterparty().clone();
                match node.handle_session(session).await {
                    Ok(outcome) => debug!("session finished party={} counterparty={} outcome={}", node.party, counterparty, outcome_label(&outcome)),
                    Err(err) => warn!("session failed party={} counterparty={} error={}", node.party, counterparty, err),
                }
            });
        }
    }
}

fn outcome_label(outcome: &ResponderOutcome) -> &'static str {
    match outcome {
        ResponderOutcome::Recorded(_) => "recorded",
        ResponderOutcome::Rejected { .. } => "rejected",
        ResponderOutcome::Aborted { .. } => "aborted",
    }
}
