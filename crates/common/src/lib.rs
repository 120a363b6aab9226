//! VidCrop Common Utilities
//!
//! Shared infrastructure for all VidCrop crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - Runtime configuration defaults

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
