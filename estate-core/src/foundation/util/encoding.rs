use crate::foundation::{EstateError, Hash32};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parses a 32-byte hex string, with or without a `0x` prefix.
pub fn parse_hex_32bytes(value: &str) -> Result<Hash32, EstateError> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    let bytes = hex::decode(stripped)?;
    bytes.as_slice().try_into().map_err(|_| EstateError::EncodingError(format!("expected 32 bytes, got {}", bytes.len())))
}

fn canonical_options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding().with_little_endian()
}

/// Deterministic binary encoding used for hashing and for the session wire format.
pub fn encode_canonical<T: Serialize>(value: &T) -> Result<Vec<u8>, EstateError> {
    canonical_options().serialize(value).map_err(|err| crate::serde_err!("bincode", err))
}

pub fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EstateError> {
    canonical_options().deserialize(bytes).map_err(|err| crate::serde_err!("bincode", err))
}
