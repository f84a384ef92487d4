//! Steadyhand Common Utilities
//!
//! Shared infrastructure for all Steadyhand crates:
//! - Error types and result aliases
//! - Clock utilities for sample timestamps
//! - Tracing/logging initialization
//! - Configuration loading and validation

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
