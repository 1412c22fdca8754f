//! Boundary to the embedding host's code evaluator.

use crate::scope::Scope;
use sprog_types::Result;
use super_values::Value;

/// Runs free-form code strings for the `eval` operation.
///
/// The runtime never interprets such code itself. Failures should be
/// reported as `SprogError::Host`.
pub trait HostEvaluator {
    fn evaluate(&self, scope: &Scope, code: &str) -> Result<Value>;
}
