//! Utilities Module
//!
//! Common utilities used across the crate.

mod deadline;
pub mod crypto;
pub mod logging;

pub use crypto::*;
pub use deadline::*;
