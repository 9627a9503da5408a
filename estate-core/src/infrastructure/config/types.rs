use crate::domain::SignerPolicy;
use crate::foundation::{PartyId, DEFAULT_FINALITY_TIMEOUT_MS, DEFAULT_SESSION_OPEN_TIMEOUT_MS, DEFAULT_SIGNATURE_TIMEOUT_MS};
use figment::value::{Dict, Map};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PARTY: &str = "O=PartyA,L=London,C=GB";
pub const DEFAULT_NOTARY: &str = "O=Notary";
pub const DEFAULT_LOG_FILTERS: &str = "info";

/// Identity of this node and the finality service it uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This node's party identity, e.g. `O=PartyA,L=London,C=GB`.
    #[serde(default = "default_party")]
    pub party: String,
    /// Finality service named in every transition this node initiates.
    #[serde(default = "default_notary")]
    pub notary: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { party: default_party(), notary: default_notary() }
    }
}

impl NodeConfig {
    pub fn party_id(&self) -> PartyId {
        PartyId::new(self.party.trim())
    }

    pub fn notary_id(&self) -> PartyId {
        PartyId::new(self.notary.trim())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Per-counterparty wait for a signature, measured from when the proposal is sent.
    #[serde(default = "default_signature_timeout_ms")]
    pub signature_timeout_ms: u64,
    #[serde(default = "default_finality_timeout_ms")]
    pub finality_timeout_ms: u64,
    #[serde(default = "default_session_open_timeout_ms")]
    pub session_open_timeout_ms: u64,
    #[serde(default)]
    pub signer_policy: SignerPolicy,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            signature_timeout_ms: DEFAULT_SIGNATURE_TIMEOUT_MS,
            finality_timeout_ms: DEFAULT_FINALITY_TIMEOUT_MS,
            session_open_timeout_ms: DEFAULT_SESSION_OPEN_TIMEOUT_MS,
            signer_policy: SignerPolicy::default(),
        }
    }
}

impl CoordinationConfig {
    pub fn signature_timeout(&self) -> Duration {
        Duration::from_millis(self.signature_timeout_ms)
    }

    pub fn finality_timeout(&self) -> Duration {
        Duration::from_millis(self.finality_timeout_ms)
    }

    pub fn session_open_timeout(&self) -> Duration {
        Duration::from_millis(self.session_open_timeout_ms)
    }

    /// How long an initiator waits for a counterparty to confirm it recorded the result.
    pub fn ack_timeout(&self) -> Duration {
        self.signature_timeout()
    }

    /// How long a counterparty waits for the result after signing.
    ///
    /// Covers the initiator's remaining budget: the slowest other session open, that signer's
    /// answer and the finality service, with one more acknowledgement window on top.
    pub fn finalized_wait(&self) -> Duration {
        self.session_open_timeout() + self.signature_timeout() + self.finality_timeout() + self.ack_timeout()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter expression passed to `init_logger`, e.g. `info,estate_core=debug`.
    #[serde(default = "default_log_filters")]
    pub filters: String,
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filters: default_log_filters(), log_dir: None }
    }
}

/// Parties started by the in-process devnet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevnetConfig {
    #[serde(default = "default_devnet_parties")]
    pub parties: Vec<String>,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self { parties: default_devnet_parties() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub coordination: CoordinationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub devnet: DevnetConfig,
    /// Raw `[profiles.<name>]` tables; applied by the loader, never serialized back.
    #[serde(default, skip_serializing)]
    pub profiles: Option<Map<String, Dict>>,
}

fn default_party() -> String {
    DEFAULT_PARTY.to_string()
}

fn default_notary() -> String {
    DEFAULT_NOTARY.to_string()
}

fn default_signature_timeout_ms() -> u64 {
    DEFAULT_SIGNATURE_TIMEOUT_MS
}

fn default_finality_timeout_ms() -> u64 {
    DEFAULT_FINALITY_TIMEOUT_MS
}

fn default_session_open_timeout_ms() -> u64 {
    DEFAULT_SESSION_OPEN_TIMEOUT_MS
}

fn default_log_filters() -> String {
    DEFAULT_LOG_FILTERS.to_string()
}

fn default_devnet_parties() -> Vec<String> {
    [DEFAULT_PARTY, "O=PartyB,L=New York,C=US", "O=PartyC,L=Paris,C=FR"].iter().map(|party| party.to_string()).collect()
}
