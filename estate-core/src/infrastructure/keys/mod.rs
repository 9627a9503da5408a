pub mod ed25519;
pub mod traits;

pub use ed25519::{Ed25519Identity, KeyDirectory, LocalSigningService};
pub use traits::SigningService;
