//! In-process network: one node per party, a shared session hub, one notary.

use estate_core::application::{NodeHooks, NodeServices, PropertyNode};
use estate_core::foundation::{EstateError, PartyId};
use estate_core::infrastructure::config::{AppConfig, CoordinationConfig, DEFAULT_NOTARY};
use estate_core::infrastructure::finality::InMemoryNotary;
use estate_core::infrastructure::keys::{Ed25519Identity, KeyDirectory, LocalSigningService};
use estate_core::infrastructure::storage::MemoryRecordStore;
use estate_core::infrastructure::transport::MockHub;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct DevnetBuilder {
    parties: Vec<PartyId>,
    notary: PartyId,
    coordination: CoordinationConfig,
    hooks: HashMap<PartyId, NodeHooks>,
    offline: HashSet<PartyId>,
}

impl DevnetBuilder {
    pub fn new(parties: impl IntoIterator<Item = PartyId>) -> Self {
        Self {
            parties: parties.into_iter().collect(),
            notary: PartyId::from(DEFAULT_NOTARY),
            coordination: CoordinationConfig::default(),
            hooks: HashMap::new(),
            offline: HashSet::new(),
        }
    }

    pub fn notary(mut self, notary: PartyId) -> Self {
        self.notary = notary;
        self
    }

    pub fn coordination(mut self, coordination: CoordinationConfig) -> Self {
        self.coordination = coordination;
        self
    }

    pub fn hooks(mut self, party: PartyId, hooks: NodeHooks) -> Self {
        self.hooks.insert(party, hooks);
        self
    }

    /// Registers `party` on the hub without answering its sessions.
    pub fn offline(mut self, party: PartyId) -> Self {
        self.offline.insert(party);
        self
    }

    /// Wires every node and spawns the responders. Must run inside a tokio runtime.
    pub fn start(mut self) -> Result<Devnet, EstateError> {
        if self.parties.is_empty() {
            return Err(EstateError::ConfigError("devnet needs at least one party".to_string()));
        }
        let hub = MockHub::new();
        let directory = Arc::new(KeyDirectory::new());
        let notary = Arc::new(InMemoryNotary::new(Ed25519Identity::generate(self.notary.clone()), Arc::clone(&directory))?);

        let mut nodes = BTreeMap::new();
        let mut tasks = Vec::new();
        for party in &self.parties {
            if nodes.contains_key(party) {
                return Err(EstateError::ConfigError(format!("party {party} listed twice")));
            }
            let signing = LocalSigningService::new(Arc::clone(&directory)).with_identity(Ed25519Identity::generate(party.clone()))?;
            let services = NodeServices {
                store: Arc::new(MemoryRecordStore::new()),
                signing: Arc::new(signing),
                transport: Arc::new(hub.register(party.clone())?),
                finality: notary.clone(),
            };
            let hooks = self.hooks.remove(party).unwrap_or_default();
            let node = Arc::new(PropertyNode::with_hooks(party.clone(), self.notary.clone(), &self.coordination, services, hooks));

            if self.offline.contains(party) {
                info!("devnet party offline party={}", party);
            } else {
                let serving = Arc::clone(&node);
                tasks.push(tokio::spawn(async move {
                    let party = serving.party().clone();
                    let result = serving.serve().await;
                    if let Err(err) = &result {
                        warn!("devnet responder stopped party={} error={}", party, err);
                    }
                    result
                }));
            }
            nodes.insert(party.clone(), node);
        }
        info!("devnet started parties={} notary={}", nodes.len(), self.notary);
        Ok(Devnet { hub, directory, notary, order: self.parties, nodes, tasks })
    }
}

pub struct Devnet {
    hub: Arc<MockHub>,
    directory: Arc<KeyDirectory>,
    notary: Arc<InMemoryNotary>,
    order: Vec<PartyId>,
    nodes: BTreeMap<PartyId, Arc<PropertyNode>>,
    tasks: Vec<JoinHandle<Result<(), EstateError>>>,
}

impl Devnet {
    pub fn builder(parties: impl IntoIterator<Item = PartyId>) -> DevnetBuilder {
        DevnetBuilder::new(parties)
    }

    /// Parties, notary and timeouts taken from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, EstateError> {
        DevnetBuilder::new(config.devnet.parties.iter().map(|party| PartyId::new(party.trim())))
            .notary(config.node.notary_id())
            .coordination(config.coordination.clone())
            .start()
    }

    pub fn node(&self, party: &PartyId) -> Result<Arc<PropertyNode>, EstateError> {
        self.nodes.get(party).cloned().ok_or_else(|| EstateError::ConfigError(format!("party {party} is not part of the devnet")))
    }

    /// Parties in the order they were configured.
    pub fn parties(&self) -> Vec<PartyId> {
        self.order.clone()
    }

    pub fn notary(&self) -> &Arc<InMemoryNotary> {
        &self.notary
    }

    pub fn hub(&self) -> &Arc<MockHub> {
        &self.hub
    }

    pub fn directory(&self) -> &Arc<KeyDirectory> {
        &self.directory
    }

    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!("devnet stopped parties={}", self.nodes.len());
    }
}
