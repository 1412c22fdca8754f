//! Numeric arithmetic on `left` and `right`. `add` also joins two strings.

use super::resolve;
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::Value;

fn numbers(scope: &Scope, params: &Params, op: &str) -> Result<(f64, f64)> {
    let left = resolve(scope, params, "left")?;
    let right = resolve(scope, params, "right")?;
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(SprogError::Validation(format!(
            "'{op}' needs two numbers, got {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

pub(super) fn add(scope: &Scope, params: &Params) -> Result<Flow> {
    let left = resolve(scope, params, "left")?;
    let right = resolve(scope, params, "right")?;
    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r).into()),
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{l}{r}")).into()),
        _ => Err(SprogError::Validation(format!(
            "'add' needs two numbers or two strings, got {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

pub(super) fn subtract(scope: &Scope, params: &Params) -> Result<Flow> {
    let (l, r) = numbers(scope, params, "subtract")?;
    Ok(Value::Number(l - r).into())
}

pub(super) fn multiply(scope: &Scope, params: &Params) -> Result<Flow> {
    let (l, r) = numbers(scope, params, "multiply")?;
    Ok(Value::Number(l * r).into())
}

/// IEEE semantics: dividing by zero yields an infinity or NaN.
pub(super) fn divide(scope: &Scope, params: &Params) -> Result<Flow> {
    let (l, r) = numbers(scope, params, "divide")?;
    Ok(Value::Number(l / r).into())
}

pub(super) fn modulo(scope: &Scope, params: &Params) -> Result<Flow> {
    let (l, r) = numbers(scope, params, "modulo")?;
    Ok(Value::Number(l % r).into())
}
