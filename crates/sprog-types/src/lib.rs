//! Shared types for the sprog runtime.
//!
//! This crate defines the error taxonomy, deep-path parsing and the runtime
//! configuration used by both the value model (`super-values`) and the
//! evaluator (`sprog-eval`).

mod config;
mod error;
pub mod path;

pub use config::RuntimeConfig;
pub use error::{ErrorCategory, ErrorCode, ErrorReport, SprogError};

/// Result type used throughout the sprog crates.
pub type Result<T> = std::result::Result<T, SprogError>;
