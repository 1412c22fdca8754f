//! `if`: ordered branches, first match wins.
//!
//! ```json
//! { "$sprog": "if", "branches": [
//!     { "condition": [<expr>, ...], "lines": [...] },
//!     { "default": true, "lines": [...] } ] }
//! ```
//!
//! With a top-level `switch`, branches use `case` instead of `condition`
//! and match when the resolved case equals the resolved switch value. A
//! `condition` list matches when every entry is truthy (checked left to
//! right, stopping at the first falsy one). The matching branch runs in a
//! child scope.

use super::{lines, raw, require};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::{Object, Value};

enum Test<'a> {
    Conditions(&'a [Value]),
    Condition(&'a Value),
    Case(&'a Value),
    Always,
}

struct Branch<'a> {
    test: Test<'a>,
    lines: &'a [Value],
}

pub(super) fn if_op(scope: &Scope, params: &Params) -> Result<Flow> {
    let switch = raw(params, "switch");
    let branches = parse_branches(params, switch.is_some())?;
    let switch = match switch {
        Some(expr) => Some(scope.resolve_deep(expr)?),
        None => None,
    };

    for branch in branches {
        let matched = match branch.test {
            Test::Always => true,
            Test::Condition(expr) => scope.resolve_deep(expr)?.is_truthy(),
            Test::Conditions(exprs) => all_truthy(scope, exprs)?,
            Test::Case(expr) => Some(scope.resolve_deep(expr)?) == switch,
        };
        if matched {
            return scope.child(Object::new())?.run_lines(branch.lines);
        }
    }
    Ok(Flow::undefined())
}

fn all_truthy(scope: &Scope, exprs: &[Value]) -> Result<bool> {
    for expr in exprs {
        if !scope.resolve_deep(expr)?.is_truthy() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Check the branch list before anything is evaluated.
fn parse_branches(params: &Params, with_switch: bool) -> Result<Vec<Branch<'_>>> {
    let items = match require(params, "if", "branches")? {
        Value::Array(items) => items,
        other => {
            return Err(SprogError::Definition(format!(
                "'if' branches must be an array, got {}",
                other.type_name()
            )))
        }
    };
    let last = items.len().saturating_sub(1);
    let test_key = if with_switch { "case" } else { "condition" };

    let mut branches = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(record) = item else {
            return Err(SprogError::Definition(format!(
                "'if' branch {index} must be a record, got {}",
                item.type_name()
            )));
        };
        let is_default = record.get("default").is_some_and(Value::is_truthy);
        let test = match (record.get(test_key).filter(|v| !v.is_undefined()), with_switch) {
            (Some(expr), true) => Test::Case(expr),
            (Some(Value::Array(exprs)), false) => Test::Conditions(exprs),
            (Some(expr), false) => Test::Condition(expr),
            (None, _) => {
                if index == 0 {
                    return Err(SprogError::Definition(format!(
                        "first 'if' branch needs a '{test_key}'"
                    )));
                }
                if !is_default && index != last {
                    return Err(SprogError::Definition(format!(
                        "'if' branch {index} needs a '{test_key}' or 'default: true'"
                    )));
                }
                Test::Always
            }
        };
        branches.push(Branch {
            test,
            lines: lines(record, "if", "lines")?,
        });
    }
    Ok(branches)
}
