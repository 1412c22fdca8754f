//! The base operation vocabulary.
//!
//! Each operation is a plain `fn(&Scope, &Params) -> Result<Flow>`.
//! Parameters arrive raw; an operation resolves only what it needs, in
//! declaration order.

mod arithmetic;
mod callable;
mod conditional;
mod containers;
mod iteration;
mod logic;
mod misc;
mod path;

use crate::registry::{Params, RegistryBuilder};
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::Value;

pub(crate) fn register_base(builder: &mut RegistryBuilder) {
    builder.insert("if", conditional::if_op);
    builder.insert("forEach", iteration::for_each);

    builder.insert("and", logic::and);
    builder.insert("or", logic::or);
    builder.insert("not", logic::not);
    builder.insert("equal", logic::equal);
    builder.insert("notEqual", logic::not_equal);
    builder.insert("greater", logic::greater);
    builder.insert("less", logic::less);
    builder.insert("greaterOrEqual", logic::greater_or_equal);
    builder.insert("lessOrEqual", logic::less_or_equal);

    builder.insert("getValue", path::get_value);
    builder.insert("setValue", path::set_value);
    builder.insert("deleteValue", path::delete_value);
    builder.insert("declare", path::declare);

    builder.insert("data", containers::data);
    builder.insert("struct", containers::structure);
    builder.insert("list", containers::list);

    builder.insert("function", callable::function);
    builder.insert("exec", callable::exec);
    builder.insert("apply", callable::apply);
    builder.insert("call", callable::call);
    builder.insert("return", callable::return_op);
    builder.insert("break", callable::break_op);
    builder.insert("continue", callable::continue_op);

    builder.insert("add", arithmetic::add);
    builder.insert("subtract", arithmetic::subtract);
    builder.insert("multiply", arithmetic::multiply);
    builder.insert("divide", arithmetic::divide);
    builder.insert("modulo", arithmetic::modulo);

    builder.insert("lines", misc::lines_op);
    builder.insert("log", misc::log);
    builder.insert("eval", misc::eval);
}

// ══════════════════════════════════════════════════════════════════════════
// Parameter helpers
// ══════════════════════════════════════════════════════════════════════════

/// Raw parameter, treating an explicit `undefined` as absent.
fn raw<'a>(params: &'a Params, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|value| !value.is_undefined())
}

fn require<'a>(params: &'a Params, op: &str, name: &str) -> Result<&'a Value> {
    raw(params, name)
        .ok_or_else(|| SprogError::Definition(format!("'{op}' requires parameter '{name}'")))
}

/// Resolved parameter; `undefined` when absent.
fn resolve(scope: &Scope, params: &Params, name: &str) -> Result<Value> {
    match raw(params, name) {
        Some(value) => scope.resolve_deep(value),
        None => Ok(Value::Undefined),
    }
}

fn resolve_required(scope: &Scope, params: &Params, op: &str, name: &str) -> Result<Value> {
    scope.resolve_deep(require(params, op, name)?)
}

fn resolve_string(scope: &Scope, params: &Params, op: &str, name: &str) -> Result<String> {
    match resolve_required(scope, params, op, name)? {
        Value::String(s) => Ok(s),
        other => Err(SprogError::Validation(format!(
            "'{op}' parameter '{name}' must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// A `lines` parameter: always a literal array, never resolved up front.
fn lines<'a>(params: &'a Params, op: &str, name: &str) -> Result<&'a [Value]> {
    match raw(params, name) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(SprogError::Definition(format!(
            "'{op}' parameter '{name}' must be an array of lines, got {}",
            other.type_name()
        ))),
    }
}
