use crate::foundation::{EstateError, Hash32, PartyId};

/// Signature production and verification on behalf of parties.
///
/// Callers only pass 32-byte payloads from `domain::hashes`; they never touch key material.
pub trait SigningService: Send + Sync {
    fn sign(&self, payload: &Hash32, party: &PartyId) -> Result<Vec<u8>, EstateError>;

    fn verify(&self, payload: &Hash32, signature: &[u8], party: &PartyId) -> bool;
}
