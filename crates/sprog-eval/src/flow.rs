//! Control outcome of running one node.

use super_values::Value;

/// What running a node produced.
///
/// Loops and blocks match on this instead of inspecting values for
/// sentinels: `Continue`/`Break` end the current iteration or loop,
/// `Return` unwinds to the nearest loop or callable unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Continue,
    Break,
    Return(Value),
}

impl Flow {
    /// The carried value; `undefined` for `Continue` and `Break`.
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Return(value) => value,
            Flow::Continue | Flow::Break => Value::Undefined,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Flow::Normal(_))
    }

    pub fn undefined() -> Self {
        Flow::Normal(Value::Undefined)
    }
}

impl From<Value> for Flow {
    fn from(value: Value) -> Self {
        Flow::Normal(value)
    }
}
