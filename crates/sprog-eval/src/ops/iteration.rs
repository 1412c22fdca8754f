//! `forEach`: iterate an array, list, object or container.
//!
//! ```json
//! { "$sprog": "forEach", "in": <expr>, "reverse": false, "lines": [...] }
//! ```
//!
//! Each iteration runs in a child scope holding the element (under the
//! configured item key), its index or key (configured key key), `isFirst`,
//! `isLast`, and three step controls callable from the body:
//!
//! - `skipNext()` skips the following element;
//! - `skip({n})` skips the next `n` elements;
//! - `toStep({n})` continues at index `n` of the collection (counted from
//!   the end when iterating in reverse). An index outside the collection
//!   stops the loop.
//!
//! `continue` ends the iteration, `break` ends the loop, and `return` or
//! any other line yielding a defined value ends the loop with that value.

use super::{lines, resolve, resolve_required};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use sprog_types::{Result, SprogError};
use super_values::{Function, Object, ReactiveContainer, Value};
use std::cell::Cell;
use std::rc::Rc;

enum Step {
    Next,
    Stop(Value),
}

pub(super) fn for_each(scope: &Scope, params: &Params) -> Result<Flow> {
    let collection = resolve_required(scope, params, "forEach", "in")?;
    let reverse = resolve(scope, params, "reverse")?.is_truthy();
    let body = lines(params, "forEach", "lines")?;

    let entries = entries_of(collection)?;
    let len = entries.len();
    let mut order: Vec<usize> = (0..len).collect();
    if reverse {
        order.reverse();
    }

    let jump: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));
    let mut pos = 0;
    while pos < len {
        let (key, item) = &entries[order[pos]];
        let mut vars = Object::new();
        vars.insert(scope.config().item_key.clone(), item.clone());
        vars.insert(scope.config().key_key.clone(), key.clone());
        vars.insert("isFirst".into(), Value::Bool(pos == 0));
        vars.insert("isLast".into(), Value::Bool(pos + 1 == len));
        for (name, control) in step_controls(&jump, pos, len, reverse) {
            vars.insert(name.into(), Value::Function(control));
        }

        let frame = scope.child(vars)?;
        if let Step::Stop(value) = run_body(&frame, body)? {
            return Ok(Flow::Normal(value));
        }
        pos = jump.take().unwrap_or(pos + 1);
    }
    Ok(Flow::undefined())
}

fn run_body(frame: &Scope, body: &[Value]) -> Result<Step> {
    for line in body {
        match frame.run_line(line)? {
            Flow::Normal(value) if value.is_undefined() => {}
            Flow::Normal(value) | Flow::Return(value) => return Ok(Step::Stop(value)),
            Flow::Continue => return Ok(Step::Next),
            Flow::Break => return Ok(Step::Stop(Value::Undefined)),
        }
    }
    Ok(Step::Next)
}

fn indexed(items: Vec<Value>) -> Vec<(Value, Value)> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (Value::from(i), item))
        .collect()
}

fn keyed(container: &dyn ReactiveContainer) -> Result<Vec<(Value, Value)>> {
    container.ensure_initialized()?;
    Ok(container
        .my_keys()
        .into_iter()
        .map(|key| {
            let value = container.get_own_value(&key);
            (Value::String(key), value)
        })
        .collect())
}

/// `(key, element)` pairs in natural order.
fn entries_of(collection: Value) -> Result<Vec<(Value, Value)>> {
    match collection {
        Value::Array(items) => Ok(indexed(items)),
        Value::List(list) => Ok(indexed(list.to_vec()?)),
        Value::Object(record) => Ok(record
            .into_iter()
            .map(|(k, v)| (Value::String(k), v))
            .collect()),
        Value::Data(map) => keyed(&map),
        Value::Struct(st) => keyed(&st),
        other => Err(SprogError::Validation(format!(
            "'forEach' cannot iterate a {}",
            other.type_name()
        ))),
    }
}

fn count_arg(args: &Object, control: &str) -> Result<i64> {
    match args.get("n") {
        Some(Value::Number(n)) if n.is_finite() => Ok(n.trunc() as i64),
        Some(other) => Err(SprogError::Validation(format!(
            "'{control}' expects a number 'n', got {}",
            other.type_name()
        ))),
        None => Err(SprogError::Validation(format!("'{control}' requires 'n'"))),
    }
}

/// The three step controls for position `pos`. Each records where the
/// loop continues once the current iteration ends.
fn step_controls(
    jump: &Rc<Cell<Option<usize>>>,
    pos: usize,
    len: usize,
    reverse: bool,
) -> [(&'static str, Function); 3] {
    let skip_next = {
        let jump = jump.clone();
        Function::native("skipNext", move |_| {
            jump.set(Some(pos + 2));
            Ok(Value::Undefined)
        })
    };
    let skip = {
        let jump = jump.clone();
        Function::native("skip", move |args| {
            let n = count_arg(&args, "skip")?.max(0) as usize;
            jump.set(Some(pos + 1 + n));
            Ok(Value::Undefined)
        })
    };
    let to_step = {
        let jump = jump.clone();
        Function::native("toStep", move |args| {
            let n = count_arg(&args, "toStep")?;
            let last = len as i64 - 1;
            let target = if reverse { last - n } else { n };
            jump.set(Some(usize::try_from(target).unwrap_or(len)));
            Ok(Value::Undefined)
        })
    };
    [("skipNext", skip_next), ("skip", skip), ("toStep", to_step)]
}
