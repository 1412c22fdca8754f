//! Runtime values.

use crate::container::{Container, ListContainer, MapContainer, ReactiveContainer, StructContainer};
use indexmap::IndexMap;
use sprog_types::Result;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Insertion-ordered plain object.
pub type Object = IndexMap<String, Value>;

/// A runtime value.
///
/// Plain values (`Null` … `Object`) compare structurally. Containers and
/// functions are handles and compare by identity.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent or cleared slot; also the "no result" of an operation.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    Data(MapContainer),
    Struct(StructContainer),
    List(ListContainer),
    Function(Function),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Data(_) => "data",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
            Value::Function(_) => "function",
        }
    }

    /// `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Container handle, if this value is one.
    pub fn as_container(&self) -> Option<Container> {
        match self {
            Value::Data(map) => Some(Container::Data(map.clone())),
            Value::Struct(st) => Some(Container::Struct(st.clone())),
            Value::List(list) => Some(Container::List(list.clone())),
            _ => None,
        }
    }

    /// Deep copy with every container replaced by its plain snapshot.
    ///
    /// Uninitialized containers snapshot as `undefined`.
    pub fn to_plain(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(items.iter().map(Value::to_plain).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            Value::Data(_) | Value::Struct(_) | Value::List(_) => self
                .as_container()
                .and_then(|c| c.snapshot().ok())
                .unwrap_or(Value::Undefined),
            other => other.clone(),
        }
    }

    /// Native ordering: numbers numerically, strings lexicographically,
    /// booleans false < true. Anything else is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used by list sorting.
    ///
    /// Comparable pairs use [`Value::compare`]; otherwise values are ranked
    /// by kind, with `undefined` always last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        if let Some(ord) = self.compare(other) {
            return ord;
        }
        self.sort_rank().cmp(&other.sort_rank())
    }

    fn sort_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(n) if n.is_nan() => 3,
            Value::Number(_) => 2,
            Value::String(_) => 4,
            Value::Array(_) | Value::List(_) => 5,
            Value::Object(_) | Value::Data(_) | Value::Struct(_) => 6,
            Value::Function(_) => 7,
            Value::Undefined => 8,
        }
    }

    /// Wire form. `undefined` and functions become `null`; containers
    /// become their snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Data(_) | Value::Struct(_) | Value::List(_) => self.to_plain().to_json(),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Data(a), Value::Data(b)) => a.id() == b.id(),
            (Value::Struct(a), Value::Struct(b)) => a.id() == b.id(),
            (Value::List(a), Value::List(b)) => a.id() == b.id(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(map)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<MapContainer> for Value {
    fn from(map: MapContainer) -> Self {
        Value::Data(map)
    }
}

impl From<StructContainer> for Value {
    fn from(st: StructContainer) -> Self {
        Value::Struct(st)
    }
}

impl From<ListContainer> for Value {
    fn from(list: ListContainer) -> Self {
        Value::List(list)
    }
}

impl From<Container> for Value {
    fn from(container: Container) -> Self {
        match container {
            Container::Data(map) => Value::Data(map),
            Container::Struct(st) => Value::Struct(st),
            Container::List(list) => Value::List(list),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════

/// Something that can be invoked with named arguments.
pub trait Callable {
    fn call(&self, args: Object) -> Result<Value>;

    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Shared handle to a callable.
#[derive(Clone)]
pub struct Function(Rc<dyn Callable>);

impl Function {
    pub fn new(callable: impl Callable + 'static) -> Self {
        Self(Rc::new(callable))
    }

    /// Wrap a Rust closure.
    pub fn native(
        name: impl Into<String>,
        f: impl Fn(Object) -> Result<Value> + 'static,
    ) -> Self {
        Self::new(NativeFn {
            name: name.into(),
            f: Box::new(f),
        })
    }

    pub fn call(&self, args: Object) -> Result<Value> {
        self.0.call(args)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Partial application: the returned function merges `applied` under
    /// the arguments of each call.
    pub fn apply(&self, applied: Object) -> Function {
        let inner = self.clone();
        let name = self.name().to_string();
        Function::native(name, move |args| {
            let mut merged = applied.clone();
            merged.extend(args);
            inner.call(merged)
        })
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name())
    }
}

struct NativeFn {
    name: String,
    f: Box<dyn Fn(Object) -> Result<Value>>,
}

impl Callable for NativeFn {
    fn call(&self, args: Object) -> Result<Value> {
        (self.f)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
