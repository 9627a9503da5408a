//! Domain layer: the property record, transitions, the transition rules, and protocol state
//! machines. Pure; no I/O and no logging.

pub mod command;
pub mod coordination;
pub mod hashes;
pub mod policy;
pub mod record;
pub mod transition;
pub mod validation;

pub use command::{Command, CommandKind};
pub use policy::SignerPolicy;
pub use record::{Record, RecordVersion, StateRef};
pub use transition::{FinalizedTransition, SignedTransition, TransactionSignature, Transition};
