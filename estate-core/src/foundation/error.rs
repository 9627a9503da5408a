use crate::domain::validation::ViolationList;
use crate::foundation::{PartyId, RecordId, TransitionId};
use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationFailed,
    NotFound,
    StoreInconsistent,
    SignerRejected,
    FinalityRejected,
    Timeout,
    RecordLocked,
    SignatureInvalid,
    ProtocolViolation,
    TransportError,
    StorageError,
    SerializationError,
    ConfigError,
    KeyNotFound,
    InvalidPhaseTransition,
    MessageTooLarge,
    EncodingError,
    CommittedNotRecorded,
    IncompleteSignatures,
    TransitionIdMismatch,
    TaskFailed,
    ClockError,
    UnexpectedOutcome,
}

#[derive(Debug, Error)]
pub enum EstateError {
    #[error("validation failed: {0}")]
    ValidationFailed(ViolationList),

    #[error("no current version of record {0}")]
    NotFound(RecordId),

    #[error("record store inconsistent: {record_id} has {current_versions} current versions")]
    StoreInconsistent { record_id: RecordId, current_versions: usize },

    #[error("signer {party} rejected the proposal: {reason}")]
    SignerRejected { party: PartyId, reason: String },

    #[error("finality service rejected the transition: {reason}")]
    FinalityRejected { reason: String },

    #[error("timed out during {operation} after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("record {0} is locked by another attempt on this node")]
    RecordLocked(RecordId),

    #[error("invalid signature from {party}")]
    SignatureInvalid { party: PartyId },

    #[error("protocol violation on session with {party}: {details}")]
    ProtocolViolation { party: PartyId, details: String },

    #[error("transport error during {operation}: {details}")]
    TransportError { operation: String, details: String },

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("invalid phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("message too large: {size} exceeds max {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The finality service accepted the transition, but these parties have not confirmed they
    /// recorded it. Retrying would only be rejected as a replay.
    #[error("transition {transition_id} committed but not recorded by {}", join_parties(.parties))]
    CommittedNotRecorded { transition_id: TransitionId, parties: Vec<PartyId> },

    #[error("transition {transition_id} is missing signatures from {}", join_parties(.missing))]
    IncompleteSignatures { transition_id: TransitionId, missing: Vec<PartyId> },

    #[error("transition id mismatch: claimed={claimed} computed={computed}")]
    TransitionIdMismatch { claimed: TransitionId, computed: TransitionId },

    #[error("{task} task failed: {details}")]
    TaskFailed { task: String, details: String },

    #[error("system clock error: {0}")]
    ClockError(String),

    #[error("unexpected outcome of {operation}: {details}")]
    UnexpectedOutcome { operation: String, details: String },
}

fn join_parties(parties: &[PartyId]) -> String {
    parties.iter().map(|party| party.to_string()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, EstateError>;

impl EstateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EstateError::ValidationFailed(_) => ErrorCode::ValidationFailed,
            EstateError::NotFound(_) => ErrorCode::NotFound,
            EstateError::StoreInconsistent { .. } => ErrorCode::StoreInconsistent,
            EstateError::SignerRejected { .. } => ErrorCode::SignerRejected,
            EstateError::FinalityRejected { .. } => ErrorCode::FinalityRejected,
            EstateError::Timeout { .. } => ErrorCode::Timeout,
            EstateError::RecordLocked(_) => ErrorCode::RecordLocked,
            EstateError::SignatureInvalid { .. } => ErrorCode::SignatureInvalid,
            EstateError::ProtocolViolation { .. } => ErrorCode::ProtocolViolation,
            EstateError::TransportError { .. } => ErrorCode::TransportError,
            EstateError::StorageError { .. } => ErrorCode::StorageError,
            EstateError::SerializationError { .. } => ErrorCode::SerializationError,
            EstateError::ConfigError(_) => ErrorCode::ConfigError,
            EstateError::KeyNotFound(_) => ErrorCode::KeyNotFound,
            EstateError::InvalidPhaseTransition { .. } => ErrorCode::InvalidPhaseTransition,
            EstateError::MessageTooLarge { .. } => ErrorCode::MessageTooLarge,
            EstateError::EncodingError(_) => ErrorCode::EncodingError,
            EstateError::CommittedNotRecorded { .. } => ErrorCode::CommittedNotRecorded,
            EstateError::IncompleteSignatures { .. } => ErrorCode::IncompleteSignatures,
            EstateError::TransitionIdMismatch { .. } => ErrorCode::TransitionIdMismatch,
            EstateError::TaskFailed { .. } => ErrorCode::TaskFailed,
            EstateError::ClockError(_) => ErrorCode::ClockError,
            EstateError::UnexpectedOutcome { .. } => ErrorCode::UnexpectedOutcome,
        }
    }

    /// Whether a caller may re-fetch the current version and start a fresh attempt.
    ///
    /// Validation failures and store inconsistencies are never retryable, and neither is a
    /// transition that already committed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EstateError::FinalityRejected { .. } | EstateError::Timeout { .. } | EstateError::RecordLocked(_))
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        EstateError::Timeout { operation: operation.into(), timeout_ms }
    }

    pub fn protocol(party: &PartyId, details: impl Into<String>) -> Self {
        EstateError::ProtocolViolation { party: party.clone(), details: details.into() }
    }

    pub fn transport(operation: impl Into<String>, details: impl Into<String>) -> Self {
        EstateError::TransportError { operation: operation.into(), details: details.into() }
    }
}

impl From<ViolationList> for EstateError {
    fn from(violations: ViolationList) -> Self {
        EstateError::ValidationFailed(violations)
    }
}

impl From<hex::FromHexError> for EstateError {
    fn from(err: hex::FromHexError) -> Self {
        EstateError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<bincode::Error> for EstateError {
    fn from(err: bincode::Error) -> Self {
        EstateError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for EstateError {
    fn from(err: serde_json::Error) -> Self {
        EstateError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<figment::Error> for EstateError {
    fn from(err: figment::Error) -> Self {
        EstateError::ConfigError(format!("config extraction failed: {}", err))
    }
}

impl From<io::Error> for EstateError {
    fn from(err: io::Error) -> Self {
        EstateError::StorageError { operation: "io".to_string(), details: err.to_string() }
    }
}

#[macro_export]
macro_rules! storage_err {
    ($op:expr, $err:expr) => {
        $crate::foundation::EstateError::StorageError { operation: $op.into(), details: $err.to_string() }
    };
}

#[macro_export]
macro_rules! serde_err {
    ($fmt:expr, $err:expr) => {
        $crate::foundation::EstateError::SerializationError { format: $fmt.into(), details: $err.to_string() }
    };
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `EstateError` variants at the call site to preserve context.
