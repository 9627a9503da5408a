pub mod phase;

pub use phase::{InitiatorPhase, ResponderPhase};
