pub mod devnet;
pub mod scenario;

pub use devnet::{Devnet, DevnetBuilder};
pub use scenario::{run_end_to_end, ScenarioReport, ScenarioStep};
