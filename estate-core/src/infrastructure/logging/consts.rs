//! Log file names, line patterns and rotation limits.

pub const LOG_FILE_NAME: &str = "estate.log";
/// Warn and error lines only.
pub const ERR_LOG_FILE_NAME: &str = "estate_err.log";

/// `timestamp [LEVEL] message [module] [thread-id]`
pub const LOG_LINE_PATTERN_COLORED: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{h({l:5})}] {m} [{M}] [{I}]{n}";
pub const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l:5}] {m} [{M}] [{I}]{n}";

/// Rotate at 20 MB.
pub const LOG_FILE_MAX_SIZE: u64 = 20_000_000;
pub const LOG_FILE_MAX_ROLLS: u32 = 5;

/// Crates logged at the app level by default; everything else is off unless named.
pub const WHITELISTED_CRATES: &[&str] = &["estate_core", "estate_service"];
