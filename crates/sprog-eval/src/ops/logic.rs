//! Boolean and comparison operations.
//!
//! `and`/`or` take `values: [expr, ...]` and short-circuit; `not` takes
//! `value`. Comparisons take `left` and `right` and never coerce: pairs
//! with no native ordering compare false.

use super::{require, resolve};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::Value;
use std::cmp::Ordering;

fn operands<'a>(params: &'a Params, op: &str) -> Result<&'a [Value]> {
    match require(params, op, "values")? {
        Value::Array(items) => Ok(items),
        other => Err(SprogError::Definition(format!(
            "'{op}' parameter 'values' must be an array, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn and(scope: &Scope, params: &Params) -> Result<Flow> {
    for operand in operands(params, "and")? {
        if !scope.resolve_deep(operand)?.is_truthy() {
            return Ok(Value::Bool(false).into());
        }
    }
    Ok(Value::Bool(true).into())
}

pub(super) fn or(scope: &Scope, params: &Params) -> Result<Flow> {
    for operand in operands(params, "or")? {
        if scope.resolve_deep(operand)?.is_truthy() {
            return Ok(Value::Bool(true).into());
        }
    }
    Ok(Value::Bool(false).into())
}

pub(super) fn not(scope: &Scope, params: &Params) -> Result<Flow> {
    let value = resolve(scope, params, "value")?;
    Ok(Value::Bool(!value.is_truthy()).into())
}

fn sides(scope: &Scope, params: &Params) -> Result<(Value, Value)> {
    let left = resolve(scope, params, "left")?;
    let right = resolve(scope, params, "right")?;
    Ok((left, right))
}

pub(super) fn equal(scope: &Scope, params: &Params) -> Result<Flow> {
    let (left, right) = sides(scope, params)?;
    Ok(Value::Bool(left == right).into())
}

pub(super) fn not_equal(scope: &Scope, params: &Params) -> Result<Flow> {
    let (left, right) = sides(scope, params)?;
    Ok(Value::Bool(left != right).into())
}

fn ordered(scope: &Scope, params: &Params, accept: fn(Ordering) -> bool) -> Result<Flow> {
    let (left, right) = sides(scope, params)?;
    let result = left.compare(&right).is_some_and(accept);
    Ok(Value::Bool(result).into())
}

pub(super) fn greater(scope: &Scope, params: &Params) -> Result<Flow> {
    ordered(scope, params, Ordering::is_gt)
}

pub(super) fn less(scope: &Scope, params: &Params) -> Result<Flow> {
    ordered(scope, params, Ordering::is_lt)
}

pub(super) fn greater_or_equal(scope: &Scope, params: &Params) -> Result<Flow> {
    ordered(scope, params, Ordering::is_ge)
}

pub(super) fn less_or_equal(scope: &Scope, params: &Params) -> Result<Flow> {
    ordered(scope, params, Ordering::is_le)
}
