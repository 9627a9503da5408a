//! System-wide constants for the estate agreement protocol.

/// Default time to wait for one counterparty's signature (30 seconds).
pub const DEFAULT_SIGNATURE_TIMEOUT_MS: u64 = 30_000;

/// Default time to wait for the finality service's verdict (30 seconds).
pub const DEFAULT_FINALITY_TIMEOUT_MS: u64 = 30_000;

/// Default time to wait for a session to a counterparty to open (5 seconds).
pub const DEFAULT_SESSION_OPEN_TIMEOUT_MS: u64 = 5_000;

/// Upper bound on any configured coordination timeout (1 hour).
///
/// Attempts longer than this hold the advisory record lock for too long.
pub const MAX_COORDINATION_TIMEOUT_MS: u64 = 60 * 60 * 1_000;

/// Maximum encoded size of one session message (1 MB).
pub const MAX_MESSAGE_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum length of a property address.
pub const MAX_ADDRESS_LENGTH: usize = 512;

/// Maximum length of a party identity string.
pub const MAX_PARTY_ID_LENGTH: usize = 256;

/// Buffered messages per direction on an in-process session.
pub const SESSION_CHANNEL_CAPACITY: usize = 64;

/// Clock override for deterministic tests (nanoseconds since the unix epoch).
pub const TEST_NOW_NANOS_ENV_VAR: &str = "ESTATE_TEST_NOW_NANOS";

/// Ed25519 signature size in bytes.
pub const ED25519_SIGNATURE_SIZE: usize = 64;
