pub mod memory;
pub mod traits;

pub use memory::InMemoryNotary;
pub use traits::{FinalityOutcome, FinalityService};
