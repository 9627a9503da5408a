pub mod rules;
pub mod types;

pub use rules::{check_signers, validate_proposal, validate_transition};
pub use types::{Violation, ViolationList};
