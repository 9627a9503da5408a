use crate::foundation::{EstateError, Hash32, PartyId, ED25519_SIGNATURE_SIZE};
use crate::infrastructure::keys::SigningService;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A party's ed25519 key pair.
#[derive(Clone)]
pub struct Ed25519Identity {
    pub party: PartyId,
    key: SigningKey,
}

impl Ed25519Identity {
    pub fn from_seed(party: PartyId, seed: [u8; 32]) -> Self {
        Self { party, key: SigningKey::from_bytes(&seed) }
    }

    pub fn generate(party: PartyId) -> Self {
        Self::from_seed(party, rand::random::<[u8; 32]>())
    }

    pub fn sign_payload(&self, payload: &Hash32) -> Vec<u8> {
        self.key.sign(payload).to_bytes().to_vec()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Identity").field("party", &self.party).finish_non_exhaustive()
    }
}

/// Public keys of every known party, shared by all nodes of one network.
#[derive(Default)]
pub struct KeyDirectory {
    keys: RwLock<HashMap<PartyId, VerifyingKey>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, party: PartyId, key: VerifyingKey) -> Result<(), EstateError> {
        self.keys.write().map_err(|_| crate::storage_err!("key directory lock", "poisoned"))?.insert(party, key);
        Ok(())
    }

    pub fn contains(&self, party: &PartyId) -> bool {
        self.keys.read().map(|keys| keys.contains_key(party)).unwrap_or(false)
    }

    pub fn verify(&self, party: &PartyId, payload: &Hash32, signature: &[u8]) -> bool {
        if signature.len() != ED25519_SIGNATURE_SIZE {
            return false;
        }
        let Ok(keys) = self.keys.read() else {
            return false;
        };
        let Some(key) = keys.get(party) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify_strict(payload, &signature).is_ok()
    }
}

/// Signs with the key pairs held by this process and verifies against the shared directory.
pub struct LocalSigningService {
    identities: HashMap<PartyId, Ed25519Identity>,
    directory: Arc<KeyDirectory>,
}

impl LocalSigningService {
    pub fn new(directory: Arc<KeyDirectory>) -> Self {
        Self { identities: HashMap::new(), directory }
    }

    /// Holds `identity` locally and publishes its public key.
    pub fn with_identity(mut self, identity: Ed25519Identity) -> Result<Self, EstateError> {
        self.directory.register(identity.party.clone(), identity.verifying_key())?;
        self.identities.insert(identity.party.clone(), identity);
        Ok(self)
    }

    pub fn directory(&self) -> &Arc<KeyDirectory> {
        &self.directory
    }
}

impl SigningService for LocalSigningService {
    fn sign(&self, payload: &Hash32, party: &PartyId) -> Result<Vec<u8>, EstateError> {
        let identity = self.identities.get(party).ok_or_else(|| EstateError::KeyNotFound(party.to_string()))?;
        Ok(identity.sign_payload(payload))
    }

    fn verify(&self, payload: &Hash32, signature: &[u8], party: &PartyId) -> bool {
        self.directory.verify(party, payload, signature)
    }
}
