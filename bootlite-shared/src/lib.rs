//! Types shared between the bootlite orchestrator and the crates that
//! plug components into it.

pub mod errors;

pub use errors::{BootError, BootResult};
