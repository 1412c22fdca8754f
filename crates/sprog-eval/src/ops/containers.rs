//! Container constructors.
//!
//! - `data`: `{ definitions?, values? }` → initialized map
//! - `struct`: `{ definitions, values?, readonly? }` → initialized struct
//! - `list`: `{ definition?, defaults?, values? }` → initialized list
//!
//! Definitions are taken literally; values are resolved.

use super::{raw, resolve};
use crate::flow::Flow;
use crate::registry::Params;
use crate::scope::Scope;
use indexmap::IndexMap;
use sprog_types::{Result, SprogError};
use super_values::{
    definitions_from_object, ItemDefinition, ListContainer, MapContainer, Object,
    StructContainer, Value,
};

fn definitions(params: &Params, op: &str) -> Result<IndexMap<String, ItemDefinition>> {
    match raw(params, "definitions") {
        None => Ok(IndexMap::new()),
        Some(Value::Object(record)) => definitions_from_object(record),
        Some(other) => Err(SprogError::Definition(format!(
            "'{op}' definitions must be a record, got {}",
            other.type_name()
        ))),
    }
}

fn object_values(scope: &Scope, params: &Params, op: &str) -> Result<Option<Object>> {
    match resolve(scope, params, "values")? {
        Value::Undefined => Ok(None),
        Value::Object(record) => Ok(Some(record)),
        other => Err(SprogError::Validation(format!(
            "'{op}' values must be an object, got {}",
            other.type_name()
        ))),
    }
}

fn array_param(scope: &Scope, params: &Params, name: &str) -> Result<Option<Vec<Value>>> {
    match resolve(scope, params, name)? {
        Value::Undefined => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        other => Err(SprogError::Validation(format!(
            "'list' {name} must be an array, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn data(scope: &Scope, params: &Params) -> Result<Flow> {
    let map = MapContainer::new(definitions(params, "data")?);
    map.init(object_values(scope, params, "data")?)?;
    Ok(Value::Data(map).into())
}

pub(super) fn structure(scope: &Scope, params: &Params) -> Result<Flow> {
    let readonly = resolve(scope, params, "readonly")?.is_truthy();
    let st = StructContainer::new(definitions(params, "struct")?, readonly);
    st.init(object_values(scope, params, "struct")?)?;
    Ok(Value::Struct(st).into())
}

pub(super) fn list(scope: &Scope, params: &Params) -> Result<Flow> {
    let definition = match raw(params, "definition") {
        Some(raw_def) => ItemDefinition::from_value(raw_def)?,
        None => ItemDefinition::any(),
    };
    let list = ListContainer::new(definition, array_param(scope, params, "defaults")?);
    list.init(array_param(scope, params, "values")?)?;
    Ok(Value::List(list).into())
}
