//! Infrastructure layer: external collaborators and their in-process implementations.

pub mod config;
pub mod finality;
pub mod keys;
pub mod logging;
pub mod storage;
pub mod transport;
