//! Standard library bound under the library key of every frame.
//!
//! Each entry is a native function taking named arguments. Arguments are
//! read as plain data, so containers are flattened to snapshots first.

use sprog_types::path::{join_path, split_path};
use sprog_types::{Result, SprogError};
use super_values::{Function, Object, Value};

/// The library object.
pub fn library() -> Value {
    let mut lib = Object::new();
    for function in [
        Function::native("spliceValue", splice_value),
        Function::native("dedup", dedup),
        Function::native("splitPath", split),
        Function::native("joinPath", join),
        Function::native("omit", omit),
    ] {
        lib.insert(function.name().to_string(), Value::Function(function));
    }
    Value::Object(lib)
}

fn arg(args: &Object, name: &str) -> Value {
    args.get(name).map(Value::to_plain).unwrap_or(Value::Undefined)
}

fn array_arg(args: &Object, func: &str, name: &str) -> Result<Vec<Value>> {
    match arg(args, name) {
        Value::Array(items) => Ok(items),
        other => Err(SprogError::Validation(format!(
            "{func}: '{name}' must be an array, got {}",
            other.type_name()
        ))),
    }
}

/// `{ array, value }`: copy of `array` without the first `value`.
fn splice_value(args: Object) -> Result<Value> {
    let mut items = array_arg(&args, "spliceValue", "array")?;
    let value = arg(&args, "value");
    if let Some(index) = items.iter().position(|item| *item == value) {
        items.remove(index);
    }
    Ok(Value::Array(items))
}

/// `{ array }`: first occurrence of every element, in order.
fn dedup(args: Object) -> Result<Value> {
    let items = array_arg(&args, "dedup", "array")?;
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    Ok(Value::Array(unique))
}

/// `{ path }`: segments of a dot/bracket path.
fn split(args: Object) -> Result<Value> {
    let path = match arg(&args, "path") {
        Value::String(path) => path,
        other => {
            return Err(SprogError::Validation(format!(
                "splitPath: 'path' must be a string, got {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Array(
        split_path(&path)?.into_iter().map(Value::String).collect(),
    ))
}

/// `{ segments }`: inverse of `splitPath`. Numbers are taken as indices.
fn join(args: Object) -> Result<Value> {
    let segments = array_arg(&args, "joinPath", "segments")?
        .into_iter()
        .map(|segment| match segment {
            Value::String(s) => Ok(s),
            Value::Number(n) if n.fract() == 0.0 && n >= 0.0 => Ok(format!("{}", n as u64)),
            other => Err(SprogError::Validation(format!(
                "joinPath: segment must be a string or index, got {}",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::String(join_path(&segments)))
}

/// `{ object, keys }`: copy of `object` without `keys`.
fn omit(args: Object) -> Result<Value> {
    let mut object = match arg(&args, "object") {
        Value::Object(object) => object,
        other => {
            return Err(SprogError::Validation(format!(
                "omit: 'object' must be an object, got {}",
                other.type_name()
            )))
        }
    };
    for key in array_arg(&args, "omit", "keys")? {
        if let Some(key) = key.as_str() {
            object.shift_remove(key);
        }
    }
    Ok(Value::Object(object))
}
