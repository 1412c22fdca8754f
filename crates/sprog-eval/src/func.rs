//! Callable units ("super functions").

use crate::flow::Flow;
use crate::scope::Scope;
use indexmap::IndexMap;
use sprog_types::{Result, SprogError};
use super_values::{Callable, ItemDefinition, Object, StructContainer, TypeTag, Value};

/// A body of lines bound to the scope it was defined in.
///
/// Every call validates its arguments into a fresh readonly struct, binds
/// that struct under the configured props key in a child of the defining
/// scope, and runs the lines. The first `return` ends the call with its
/// value; a body without one yields `undefined`.
pub struct SuperFunc {
    name: String,
    params: IndexMap<String, ItemDefinition>,
    lines: Vec<Value>,
    scope: Scope,
}

impl SuperFunc {
    pub fn new(
        scope: &Scope,
        name: impl Into<String>,
        params: IndexMap<String, ItemDefinition>,
        lines: Vec<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            lines,
            scope: scope.clone(),
        }
    }

    pub fn exec(&self, values: Object) -> Result<Value> {
        if let Some(unknown) = values.keys().find(|key| !self.params.contains_key(*key)) {
            return Err(SprogError::Validation(format!(
                "function '{}' has no parameter '{unknown}'",
                self.name
            )));
        }
        let props = StructContainer::new(self.params.clone(), true);
        props.init(Some(values))?;

        let frame = self.scope.child(Object::new())?;
        frame.declare(
            &self.scope.config().props_key,
            Some(ItemDefinition::new(TypeTag::Struct).readonly()),
            Some(Value::Struct(props)),
        )?;
        for line in &self.lines {
            if let Flow::Return(value) = frame.run_line(line)? {
                return Ok(value);
            }
        }
        Ok(Value::Undefined)
    }
}

impl Callable for SuperFunc {
    fn call(&self, args: Object) -> Result<Value> {
        self.exec(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
