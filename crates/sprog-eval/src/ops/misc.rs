//! Blocks, logging and host evaluation.

use super::{lines, resolve, resolve_string};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::Object;

/// `{ lines }`: run a block in a child scope. Control outcomes propagate.
pub(super) fn lines_op(scope: &Scope, params: &Params) -> Result<Flow> {
    let body = lines(params, "lines", "lines")?;
    scope.child(Object::new())?.run_lines(body)
}

/// `{ value, label? }`: emit the resolved value at info level.
pub(super) fn log(scope: &Scope, params: &Params) -> Result<Flow> {
    let value = resolve(scope, params, "value")?;
    let label = resolve(scope, params, "label")?;
    match label.as_str() {
        Some(label) => tracing::info!(label, value = %value, "sprog log"),
        None => tracing::info!(value = %value, "sprog log"),
    }
    Ok(Flow::undefined())
}

/// `{ code }`: hand a code string to the host evaluator.
pub(super) fn eval(scope: &Scope, params: &Params) -> Result<Flow> {
    let code = resolve_string(scope, params, "eval", "code")?;
    let host = scope
        .host()
        .ok_or_else(|| SprogError::Host("no host evaluator configured".into()))?;
    Ok(host.evaluate(scope, &code)?.into())
}
