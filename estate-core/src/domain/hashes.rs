use crate::domain::Transition;
use crate::foundation::util::encoding::encode_canonical;
use crate::foundation::{EstateError, Hash32, PartyId, PayloadHash, SessionId, TransitionId};

const TRANSITION_ID_DOMAIN_V1: &[u8] = b"estate:transition:v1:";
const SESSION_ID_DOMAIN_V1: &[u8] = b"estate:session:v1:";
const FINALITY_DOMAIN_V1: &[u8] = b"estate:finality:v1:";

pub fn transition_id(transition: &Transition) -> Result<TransitionId, EstateError> {
    let encoded = encode_canonical(transition)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(TRANSITION_ID_DOMAIN_V1);
    hasher.update(&encoded);
    Ok(TransitionId::new(*hasher.finalize().as_bytes()))
}

pub fn session_id(transition_id: &TransitionId, initiator: &PartyId, counterparty: &PartyId) -> SessionId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(SESSION_ID_DOMAIN_V1);
    hasher.update(transition_id.as_ref());
    update_str(&mut hasher, initiator.as_str());
    update_str(&mut hasher, counterparty.as_str());
    SessionId::new(*hasher.finalize().as_bytes())
}

/// Payload a participant signs to agree to a transition.
pub fn signing_payload(transition_id: &TransitionId) -> Hash32 {
    *transition_id.as_hash()
}

/// Payload the finality service signs; domain-separated from participant signatures.
pub fn finality_payload(transition_id: &TransitionId, notary: &PartyId) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(FINALITY_DOMAIN_V1);
    hasher.update(transition_id.as_ref());
    update_str(&mut hasher, notary.as_str());
    *hasher.finalize().as_bytes()
}

pub fn payload_hash(bytes: &[u8]) -> PayloadHash {
    PayloadHash::new(*blake3::hash(bytes).as_bytes())
}

fn update_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u32).to_le_bytes());
    hasher.update(value.as_bytes());
}
