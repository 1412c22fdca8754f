//! Callable units and control markers.
//!
//! - `function`: `{ params?, lines, name? }` → a function value
//! - `exec`: `{ function, values? }` → result of calling it
//! - `apply`: `{ function, values }` → partially applied function
//! - `call`: `{ path, args? }` → call the function stored at `path`
//! - `return`: `{ value? }`, `break`, `continue`

use super::{lines, raw, resolve, resolve_required, resolve_string};
use crate::flow::Flow;
use crate::func::SuperFunc;
use crate::registry::Params;
use crate::scope::Scope;
use indexmap::IndexMap;
use sprog_types::{Result, SprogError};
use super_values::{definitions_from_object, Function, Object, Value};

pub(super) fn function(scope: &Scope, params: &Params) -> Result<Flow> {
    let defs = match raw(params, "params") {
        None => IndexMap::new(),
        Some(Value::Object(record)) => definitions_from_object(record)?,
        Some(other) => {
            return Err(SprogError::Definition(format!(
                "'function' params must be a record, got {}",
                other.type_name()
            )))
        }
    };
    let body = lines(params, "function", "lines")?.to_vec();
    let name = match raw(params, "name") {
        Some(Value::String(name)) => name.clone(),
        _ => "anonymous".to_string(),
    };
    let func = SuperFunc::new(scope, name, defs, body);
    Ok(Value::Function(Function::new(func)).into())
}

fn callee(value: Value, what: &str) -> Result<Function> {
    match value {
        Value::Function(f) => Ok(f),
        other => Err(SprogError::NotCallable(format!(
            "{what} is a {}, not a function",
            other.type_name()
        ))),
    }
}

fn named_args(scope: &Scope, params: &Params, name: &str) -> Result<Object> {
    match resolve(scope, params, name)? {
        Value::Undefined => Ok(Object::new()),
        Value::Object(record) => Ok(record),
        other => Err(SprogError::Validation(format!(
            "'{name}' must be an object of named arguments, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn exec(scope: &Scope, params: &Params) -> Result<Flow> {
    let f = callee(resolve_required(scope, params, "exec", "function")?, "'exec' target")?;
    let values = named_args(scope, params, "values")?;
    Ok(f.call(values)?.into())
}

pub(super) fn apply(scope: &Scope, params: &Params) -> Result<Flow> {
    let f = callee(resolve_required(scope, params, "apply", "function")?, "'apply' target")?;
    let values = named_args(scope, params, "values")?;
    Ok(Value::Function(f.apply(values)).into())
}

pub(super) fn call(scope: &Scope, params: &Params) -> Result<Flow> {
    let path = resolve_string(scope, params, "call", "path")?;
    let f = callee(scope.get(&path)?, &format!("'{path}'"))?;
    let args = named_args(scope, params, "args")?;
    Ok(f.call(args)?.into())
}

pub(super) fn return_op(scope: &Scope, params: &Params) -> Result<Flow> {
    Ok(Flow::Return(resolve(scope, params, "value")?))
}

pub(super) fn break_op(_scope: &Scope, _params: &Params) -> Result<Flow> {
    Ok(Flow::Break)
}

pub(super) fn continue_op(_scope: &Scope, _params: &Params) -> Result<Flow> {
    Ok(Flow::Continue)
}
