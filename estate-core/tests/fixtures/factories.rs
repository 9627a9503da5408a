#![allow(dead_code)]

use crate::fixtures::{NOTARY, TEST_NOW_NANOS};
use async_trait::async_trait;
use estate_core::application::{LifecycleObserver, NodeHooks, NodeServices, PropertyNode, TransactionCheck};
use estate_core::domain::hashes::signing_payload;
use estate_core::domain::{CommandKind, Record, RecordVersion, SignedTransition, SignerPolicy, TransactionSignature, Transition};
use estate_core::foundation::{EstateError, PartyId, SessionId, TransitionId};
use estate_core::infrastructure::config::CoordinationConfig;
use estate_core::infrastructure::finality::InMemoryNotary;
use estate_core::infrastructure::keys::{Ed25519Identity, KeyDirectory, LocalSigningService};
use estate_core::infrastructure::storage::MemoryRecordStore;
use estate_core::infrastructure::transport::{FlowSession, MockHub, SessionTransport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub fn party(name: &str) -> PartyId {
    PartyId::from(name)
}

pub fn parties(names: &[&str]) -> Vec<PartyId> {
    names.iter().map(|name| PartyId::from(*name)).collect()
}

/// Same timeout for every wait.
pub fn coordination(timeout_ms: u64) -> CoordinationConfig {
    CoordinationConfig {
        signature_timeout_ms: timeout_ms,
        finality_timeout_ms: timeout_ms,
        session_open_timeout_ms: timeout_ms,
        signer_policy: SignerPolicy::OwnersAndTenants,
    }
}

/// Deterministic key for `name`, so tests can sign outside a node.
pub fn identity(name: &str) -> Ed25519Identity {
    let seed = *blake3::hash(name.as_bytes()).as_bytes();
    Ed25519Identity::from_seed(PartyId::from(name), seed)
}

/// A transition with the signer set the default policy requires.
pub fn transition(kind: CommandKind, inputs: Vec<RecordVersion>, output: Record, initiator: &str) -> SignedTransition {
    let required_signers = SignerPolicy::OwnersAndTenants.required_signers(inputs.iter().map(|version| &version.record).chain(std::iter::once(&output)));
    let transition = Transition {
        kind,
        inputs,
        outputs: vec![output],
        required_signers,
        notary: PartyId::from(NOTARY),
        initiator: PartyId::from(initiator),
        created_at_nanos: TEST_NOW_NANOS,
    };
    SignedTransition::new(transition).expect("transition id")
}

pub fn sign_with(signed: &mut SignedTransition, signers: &[&Ed25519Identity]) {
    let payload = signing_payload(&signed.id);
    for signer in signers {
        signed.add_signature(TransactionSignature { signer: signer.party.clone(), signature: signer.sign_payload(&payload) });
    }
}

/// Captures lifecycle events as `event:transition` strings.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events").clone()
    }

    fn push(&self, event: &str, transition_id: Option<&TransitionId>) {
        let id = transition_id.map(|id| id.short()).unwrap_or_default();
        self.events.lock().expect("events").push(format!("{event}:{id}"));
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_proposal_built(&self, transition_id: &TransitionId, _kind: CommandKind, _required_signers: usize) {
        self.push("built", Some(transition_id));
    }

    fn on_signature_received(&self, transition_id: &TransitionId, _signer: &PartyId) {
        self.push("signature", Some(transition_id));
    }

    fn on_fully_signed(&self, transition_id: &TransitionId, _signature_count: usize) {
        self.push("fully_signed", Some(transition_id));
    }

    fn on_proposal_signed(&self, transition_id: &TransitionId, _initiator: &PartyId) {
        self.push("signed", Some(transition_id));
    }

    fn on_finalized(&self, transition_id: &TransitionId, _version: &RecordVersion) {
        self.push("finalized", Some(transition_id));
    }

    fn on_failed(&self, transition_id: Option<&TransitionId>, _reason: &str) {
        self.push("failed", transition_id);
    }
}

/// Signs everything, but only after blocking for a while.
pub struct SlowCheck(pub Duration);

impl TransactionCheck for SlowCheck {
    fn check(&self, _transition: &Transition) -> Result<(), String> {
        std::thread::sleep(self.0);
        Ok(())
    }
}

/// Delays opening sessions to selected counterparties.
pub struct DelayedTransport {
    inner: Box<dyn SessionTransport>,
    delays: HashMap<PartyId, Duration>,
}

#[async_trait]
impl SessionTransport for DelayedTransport {
    fn local_party(&self) -> &PartyId {
        self.inner.local_party()
    }

    async fn open_session(&self, counterparty: &PartyId, session_id: SessionId) -> Result<Box<dyn FlowSession>, EstateError> {
        if let Some(delay) = self.delays.get(counterparty) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.open_session(counterparty, session_id).await
    }

    async fn accept(&self) -> Result<Box<dyn FlowSession>, EstateError> {
        self.inner.accept().await
    }
}

/// Nodes wired over one mock hub and one in-memory notary. Responders stop when dropped.
pub struct TestNetwork {
    pub hub: Arc<MockHub>,
    pub directory: Arc<KeyDirectory>,
    pub notary: Arc<InMemoryNotary>,
    nodes: HashMap<PartyId, Arc<PropertyNode>>,
    stores: HashMap<PartyId, Arc<MemoryRecordStore>>,
    tasks: Vec<JoinHandle<Result<(), EstateError>>>,
}

pub struct TestNetworkBuilder {
    names: Vec<String>,
    config: CoordinationConfig,
    hooks: HashMap<PartyId, NodeHooks>,
    offline: Vec<PartyId>,
    open_delays: HashMap<PartyId, HashMap<PartyId, Duration>>,
}

impl TestNetworkBuilder {
    pub fn coordination(mut self, config: CoordinationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, name: &str, hooks: NodeHooks) -> Self {
        self.hooks.insert(party(name), hooks);
        self
    }

    pub fn offline(mut self, name: &str) -> Self {
        self.offline.push(party(name));
        self
    }

    /// Sessions `from` opens to `to` take `delay` to open.
    pub fn open_delay(mut self, from: &str, to: &str, delay: Duration) -> Self {
        self.open_delays.entry(party(from)).or_default().insert(party(to), delay);
        self
    }

    pub fn start(mut self) -> TestNetwork {
        let hub = MockHub::new();
        let directory = Arc::new(KeyDirectory::new());
        let notary = Arc::new(InMemoryNotary::new(identity(NOTARY), Arc::clone(&directory)).expect("notary"));
        let mut nodes = HashMap::new();
        let mut stores = HashMap::new();
        let mut tasks = Vec::new();

        for name in &self.names {
            let party = party(name);
            let store = Arc::new(MemoryRecordStore::new());
            let signing = LocalSigningService::new(Arc::clone(&directory)).with_identity(identity(name)).expect("signing service");
            let registered = hub.register(party.clone()).expect("register");
            let transport: Arc<dyn SessionTransport> = match self.open_delays.remove(&party) {
                Some(delays) => Arc::new(DelayedTransport { inner: Box::new(registered), delays }),
                None => Arc::new(registered),
            };
            let services = NodeServices { store: store.clone(), signing: Arc::new(signing), transport, finality: notary.clone() };
            let hooks = self.hooks.remove(&party).unwrap_or_default();
            let node = Arc::new(PropertyNode::with_hooks(party.clone(), PartyId::from(NOTARY), &self.config, services, hooks));
            if !self.offline.contains(&party) {
                tasks.push(tokio::spawn(Arc::clone(&node).serve()));
            }
            nodes.insert(party.clone(), node);
            stores.insert(party, store);
        }
        TestNetwork { hub, directory, notary, nodes, stores, tasks }
    }
}

impl TestNetwork {
    pub fn builder(names: &[&str]) -> TestNetworkBuilder {
        TestNetworkBuilder {
            names: names.iter().map(|name| name.to_string()).collect(),
            config: coordination(5_000),
            hooks: HashMap::new(),
            offline: Vec::new(),
            open_delays: HashMap::new(),
        }
    }

    pub fn start(names: &[&str]) -> TestNetwork {
        Self::builder(names).start()
    }

    pub fn node(&self, name: &str) -> Arc<PropertyNode> {
        Arc::clone(self.nodes.get(&party(name)).expect("node"))
    }

    pub fn store(&self, name: &str) -> Arc<MemoryRecordStore> {
        Arc::clone(self.stores.get(&party(name)).expect("store"))
    }
}

impl Drop for TestNetwork {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
