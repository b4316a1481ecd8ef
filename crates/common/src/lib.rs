//! LiveCoder Common Library
//!
//! Shared types and error taxonomy for the LiveCoder pipeline.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

/// LiveCoder version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
