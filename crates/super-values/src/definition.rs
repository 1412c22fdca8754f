//! Item definitions: the allowed shape of a value slot.

use crate::value::{Object, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sprog_types::{Result, SprogError};
use std::fmt;

/// Closed set of slot types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
    /// Reactive map container.
    Data,
    /// Reactive struct container.
    Struct,
    /// Reactive list container.
    List,
    Function,
    /// Deferred value. Evaluation is synchronous, so only `any` slots or
    /// nullable slots holding `null` can stand in for one at runtime.
    Promise,
    /// Wildcard: accepts anything.
    Any,
}

impl TypeTag {
    pub const ALL: [TypeTag; 12] = [
        TypeTag::String,
        TypeTag::Number,
        TypeTag::Boolean,
        TypeTag::Null,
        TypeTag::Array,
        TypeTag::Object,
        TypeTag::Data,
        TypeTag::Struct,
        TypeTag::List,
        TypeTag::Function,
        TypeTag::Promise,
        TypeTag::Any,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Null => "null",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Data => "data",
            TypeTag::Struct => "struct",
            TypeTag::List => "list",
            TypeTag::Function => "function",
            TypeTag::Promise => "promise",
            TypeTag::Any => "any",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of one value slot.
///
/// The flags keep "explicitly set" apart from "omitted" so that a struct
/// declared readonly-by-default can honor an explicit `readonly: false`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    pub type_tag: TypeTag,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub readonly: Option<bool>,
    pub nullable: Option<bool>,
}

impl ItemDefinition {
    pub fn new(type_tag: TypeTag) -> Self {
        Self {
            type_tag,
            default: None,
            required: None,
            readonly: None,
            nullable: None,
        }
    }

    /// The definition undeclared keys fall back to.
    pub fn any() -> Self {
        Self::new(TypeTag::Any)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = Some(true);
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly.unwrap_or(false)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        is_corresponding_type(value, self.type_tag, self.is_nullable())
    }

    /// Value a slot starts with when nothing was supplied.
    ///
    /// `None` means the slot is required and has no default: it stays
    /// unresolved and the owner's required check reports it.
    pub fn initial_value(&self) -> Result<Option<Value>> {
        if let Some(default) = &self.default {
            return Ok(Some(default.clone()));
        }
        if self.is_required() {
            return Ok(None);
        }
        resolve_initial_value(self.type_tag, self.is_nullable()).map(Some)
    }

    /// Parse a raw definition record.
    ///
    /// Accepts either a bare type name (`"number"`) or a record
    /// `{type, default?, required?, readonly?, nullable?}`. The result has
    /// passed [`check_definition`].
    pub fn from_value(raw: &Value) -> Result<Self> {
        let def = match raw {
            Value::String(name) => Self::new(parse_type(name)?),
            Value::Object(record) => Self::from_record(record)?,
            other => {
                return Err(SprogError::Definition(format!(
                    "definition must be a type name or a record, got {}",
                    other.type_name()
                )));
            }
        };
        check_definition(&def)?;
        Ok(def)
    }

    fn from_record(record: &Object) -> Result<Self> {
        let type_tag = match record.get("type") {
            Some(Value::String(name)) => parse_type(name)?,
            Some(other) => {
                return Err(SprogError::Definition(format!(
                    "'type' must be a string, got {}",
                    other.type_name()
                )));
            }
            None => TypeTag::Any,
        };
        Ok(Self {
            type_tag,
            default: record.get("default").filter(|v| !v.is_undefined()).cloned(),
            required: flag(record, "required")?,
            readonly: flag(record, "readonly")?,
            nullable: flag(record, "nullable")?,
        })
    }

    /// Record form, the inverse of [`ItemDefinition::from_value`].
    pub fn to_value(&self) -> Value {
        let mut record = Object::new();
        record.insert("type".into(), Value::from(self.type_tag.as_str()));
        if let Some(default) = &self.default {
            record.insert("default".into(), default.clone());
        }
        for (name, flag) in [
            ("required", self.required),
            ("readonly", self.readonly),
            ("nullable", self.nullable),
        ] {
            if let Some(flag) = flag {
                record.insert(name.into(), Value::Bool(flag));
            }
        }
        Value::Object(record)
    }
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self::any()
    }
}

/// Parse a keyed set of raw definitions, keeping declaration order.
pub fn definitions_from_object(raw: &Object) -> Result<IndexMap<String, ItemDefinition>> {
    raw.iter()
        .map(|(key, def)| {
            ItemDefinition::from_value(def)
                .map(|def| (key.clone(), def))
                .map_err(|err| SprogError::Definition(format!("key '{key}': {}", err.message())))
        })
        .collect()
}

fn parse_type(name: &str) -> Result<TypeTag> {
    TypeTag::parse(name).ok_or_else(|| SprogError::Definition(format!("unknown type '{name}'")))
}

fn flag(record: &Object, name: &str) -> Result<Option<bool>> {
    match record.get(name) {
        None | Some(Value::Undefined) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(SprogError::Definition(format!(
            "'{name}' must be a boolean, got {}",
            other.type_name()
        ))),
    }
}

/// Check that a definition's default agrees with its type and nullability.
pub fn check_definition(def: &ItemDefinition) -> Result<()> {
    if let Some(default) = &def.default {
        if !def.accepts(default) {
            return Err(SprogError::Definition(format!(
                "default {} does not satisfy type '{}'{}",
                default.type_name(),
                def.type_tag,
                if def.is_nullable() { " (nullable)" } else { "" }
            )));
        }
    }
    Ok(())
}

/// Whether `value` satisfies `type_tag`.
///
/// `null` passes only nullable slots, `null`-typed slots and the wildcard.
/// Containers are matched by runtime kind, never by shape.
pub fn is_corresponding_type(value: &Value, type_tag: TypeTag, nullable: bool) -> bool {
    if type_tag == TypeTag::Any {
        return true;
    }
    match value {
        Value::Null => nullable || type_tag == TypeTag::Null,
        Value::Undefined => false,
        Value::Bool(_) => type_tag == TypeTag::Boolean,
        Value::Number(_) => type_tag == TypeTag::Number,
        Value::String(_) => type_tag == TypeTag::String,
        Value::Array(_) => type_tag == TypeTag::Array,
        Value::Object(_) => type_tag == TypeTag::Object,
        Value::Data(_) => type_tag == TypeTag::Data,
        Value::Struct(_) => type_tag == TypeTag::Struct,
        Value::List(_) => type_tag == TypeTag::List,
        Value::Function(_) => type_tag == TypeTag::Function,
    }
}

/// Zero value for a slot type.
///
/// Nullable slots start as `null`. Container, function and promise slots
/// have no zero value and must be given a default or an initial value.
pub fn resolve_initial_value(type_tag: TypeTag, nullable: bool) -> Result<Value> {
    if nullable {
        return Ok(Value::Null);
    }
    match type_tag {
        TypeTag::String => Ok(Value::String(String::new())),
        TypeTag::Number => Ok(Value::Number(0.0)),
        TypeTag::Boolean => Ok(Value::Bool(false)),
        TypeTag::Null | TypeTag::Any => Ok(Value::Null),
        TypeTag::Array => Ok(Value::Array(Vec::new())),
        TypeTag::Object => Ok(Value::Object(Object::new())),
        TypeTag::Data | TypeTag::Struct | TypeTag::List | TypeTag::Function | TypeTag::Promise => {
            Err(SprogError::Definition(format!(
                "no initial value for non-nullable type '{type_tag}'"
            )))
        }
    }
}
