//! Evaluator for sprog programs.
//!
//! A program is a JSON tree. Any record carrying the configured
//! discriminator field (`"$sprog"` by default) is an expression node naming
//! a registered operation; the rest of the record are its parameters, and
//! any parameter may itself be a node. Operations receive their parameters
//! unevaluated and resolve them on demand, so evaluation is lazy and
//! strictly ordered.
//!
//! ```ignore
//! use serde_json::json;
//! use sprog_eval::Runtime;
//!
//! let runtime = Runtime::new();
//! let out = runtime.run(&json!([
//!     { "$sprog": "setValue", "path": "x", "value": 2 },
//!     { "$sprog": "return", "value": { "$sprog": "getValue", "path": "x" } },
//! ]))?;
//! ```
//!
//! Variables live in [`Scope`]s backed by layered map containers from
//! `super-values`; control outcomes travel as [`Flow`] values.

mod flow;
mod func;
mod host;
mod ops;
mod registry;
mod runtime;
mod scope;
mod stdlib;

pub use flow::Flow;
pub use func::SuperFunc;
pub use host::HostEvaluator;
pub use registry::{BoundOperation, Operation, Params, Registry, RegistryBuilder};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scope::Scope;
pub use stdlib::library;

/// Result type of every evaluator entry point.
pub type EvalResult<T> = sprog_types::Result<T>;
