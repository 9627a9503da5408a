pub mod encoding;
pub mod messages;
pub mod mock;
pub mod traits;

pub use mock::{MockHub, MockTransport};
pub use traits::*;
