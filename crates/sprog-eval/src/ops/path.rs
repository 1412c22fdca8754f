//! Variable access by deep path, and declarations.

use super::{raw, resolve, resolve_string};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::Result;
use super_values::{ItemDefinition, Value};

/// `{ path }` → the value at `path`, `undefined` if absent.
pub(super) fn get_value(scope: &Scope, params: &Params) -> Result<Flow> {
    let path = resolve_string(scope, params, "getValue", "path")?;
    Ok(scope.get(&path)?.into())
}

/// `{ path, value }`; missing intermediate segments are created.
pub(super) fn set_value(scope: &Scope, params: &Params) -> Result<Flow> {
    let path = resolve_string(scope, params, "setValue", "path")?;
    let value = resolve(scope, params, "value")?;
    scope.set(&path, value)?;
    Ok(Flow::undefined())
}

/// `{ path }`.
pub(super) fn delete_value(scope: &Scope, params: &Params) -> Result<Flow> {
    let path = resolve_string(scope, params, "deleteValue", "path")?;
    scope.delete(&path)?;
    Ok(Flow::undefined())
}

/// `{ name, definition?, value? }`: a new variable in the current frame.
pub(super) fn declare(scope: &Scope, params: &Params) -> Result<Flow> {
    let name = resolve_string(scope, params, "declare", "name")?;
    let definition = match raw(params, "definition") {
        Some(raw_def) => Some(ItemDefinition::from_value(raw_def)?),
        None => None,
    };
    let value = Some(resolve(scope, params, "value")?).filter(|v: &Value| !v.is_undefined());
    scope.declare(&name, definition, value)?;
    Ok(Flow::undefined())
}
