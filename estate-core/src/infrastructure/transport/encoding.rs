use super::messages::{MessageEnvelope, SessionMessage};
use crate::domain::hashes;
use crate::foundation::util::encoding::{decode_canonical, encode_canonical};
use crate::foundation::{EstateError, PayloadHash, MAX_MESSAGE_SIZE_BYTES};

const WIRE_PROTOCOL_VERSION_V1: u16 = 1;

pub fn encode_envelope(envelope: &MessageEnvelope) -> Result<Vec<u8>, EstateError> {
    let body = encode_canonical(envelope)?;
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(&WIRE_PROTOCOL_VERSION_V1.to_le_bytes());
    out.extend_from_slice(&body);
    if out.len() > MAX_MESSAGE_SIZE_BYTES {
        return Err(EstateError::MessageTooLarge { size: out.len(), max: MAX_MESSAGE_SIZE_BYTES });
    }
    Ok(out)
}

pub fn decode_envelope(bytes: &[u8]) -> Result<MessageEnvelope, EstateError> {
    if bytes.len() > MAX_MESSAGE_SIZE_BYTES {
        return Err(EstateError::MessageTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE_BYTES });
    }
    if bytes.len() < 2 {
        return Err(EstateError::transport("decode_envelope", "message too short"));
    }
    let version = u16::from_le_bytes([bytes[0], bytes[1]]);
    if version != WIRE_PROTOCOL_VERSION_V1 {
        return Err(EstateError::transport(
            "decode_envelope",
            format!("wire protocol version mismatch: expected {WIRE_PROTOCOL_VERSION_V1}, got {version}"),
        ));
    }
    decode_canonical(&bytes[2..])
}

pub fn payload_hash(payload: &SessionMessage) -> Result<PayloadHash, EstateError> {
    Ok(hashes::payload_hash(&encode_canonical(payload)?))
}
