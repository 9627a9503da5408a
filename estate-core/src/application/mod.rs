//! Application layer: the commit protocol, wired from domain rules and infrastructure services.

pub mod builder;
pub mod finality;
pub mod lifecycle;
pub mod locks;
pub mod node;
pub mod responder;
pub mod signing;

pub use builder::ProposalBuilder;
pub use finality::FinalityCoordinator;
pub use lifecycle::{CompositeObserver, LifecycleObserver, LoggingObserver, NoopObserver};
pub use locks::{RecordLockGuard, RecordLocks};
pub use node::{NodeHooks, NodeServices, PropertyNode};
pub use responder::{AcceptAll, ResponderOutcome, SignResponder, TransactionCheck};
pub use signing::{CollectedSignatures, SigningCoordinator};
