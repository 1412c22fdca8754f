//! Fixed-shape container.

use super::{
    attach, begin_init, check_adoptable, debug_handle, detach, finish_init, label, type_error,
    Container, ContainerKind, Core, EventKind, Node, PrivilegedSetter, ReactiveContainer,
    WriteMode,
};
use crate::definition::ItemDefinition;
use crate::value::{Object, Value};
use indexmap::IndexMap;
use sprog_types::{Result, SprogError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub(crate) struct StructState {
    values: IndexMap<String, Value>,
    definitions: IndexMap<String, ItemDefinition>,
}

/// Container whose keys are fixed at construction.
///
/// Values may change (subject to their definitions) and may be set to
/// `null` where nullable, but keys can never be added or removed.
#[derive(Clone)]
pub struct StructContainer {
    pub(crate) node: Rc<Node<StructState>>,
}

impl StructContainer {
    /// With `default_readonly`, every key not explicitly declared
    /// `readonly: false` becomes readonly.
    pub fn new(definitions: IndexMap<String, ItemDefinition>, default_readonly: bool) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|(key, mut def)| {
                if default_readonly && def.readonly.is_none() {
                    def.readonly = Some(true);
                }
                (key, def)
            })
            .collect();
        Self {
            node: Node::new(
                ContainerKind::Struct,
                StructState {
                    values: IndexMap::new(),
                    definitions,
                },
            ),
        }
    }

    pub fn definition(&self, key: &str) -> Option<ItemDefinition> {
        self.node.state.borrow().definitions.get(key).cloned()
    }

    pub fn init(&self, initial: Option<Object>) -> Result<PrivilegedSetter> {
        begin_init(self)?;
        let mut initial = initial.unwrap_or_default();
        let definitions = self.node.state.borrow().definitions.clone();

        if let Some(unknown) = initial.keys().find(|k| !definitions.contains_key(*k)) {
            return Err(SprogError::Structural(format!(
                "{} has no key '{unknown}'",
                label(self)
            )));
        }

        let mut staged = Vec::with_capacity(definitions.len());
        let mut missing = Vec::new();
        for (key, def) in &definitions {
            let supplied = initial.shift_remove(key).filter(|v| !v.is_undefined());
            let value = match supplied {
                Some(value) => Some(value),
                None => def.initial_value()?,
            };
            match value {
                Some(value) => {
                    if !def.accepts(&value) {
                        return Err(type_error(key, def, &value));
                    }
                    check_adoptable(self, &value)?;
                    staged.push((key.clone(), value));
                }
                None => missing.push(key.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(SprogError::Validation(format!(
                "required keys not provided to {}: {}",
                label(self),
                missing.join(", ")
            )));
        }

        self.node.state.borrow_mut().values = staged.iter().cloned().collect();
        for (key, value) in &staged {
            attach(self, value, key);
        }
        Ok(finish_init(self))
    }
}

impl ReactiveContainer for StructContainer {
    fn core(&self) -> &RefCell<Core> {
        &self.node.core
    }

    fn handle(&self) -> Container {
        Container::Struct(self.clone())
    }

    fn is_key_readonly(&self, key: &str) -> bool {
        self.definition(key).is_some_and(|def| def.is_readonly())
    }

    fn my_keys(&self) -> Vec<String> {
        self.node.state.borrow().definitions.keys().cloned().collect()
    }

    fn has_own_key(&self, key: &str) -> bool {
        self.node.state.borrow().definitions.contains_key(key)
    }

    fn get_own_value(&self, key: &str) -> Value {
        self.node
            .state
            .borrow()
            .values
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn set_own_value(&self, key: &str, value: Value, mode: WriteMode) -> Result<()> {
        self.ensure_initialized()?;
        let def = self.definition(key).ok_or_else(|| {
            SprogError::Structural(format!("{} has no key '{key}'", label(self)))
        })?;
        if def.is_readonly() && !mode.is_privileged() {
            return Err(SprogError::Validation(format!(
                "key '{key}' of {} is readonly",
                label(self)
            )));
        }
        if value.is_undefined() {
            return Err(SprogError::Validation(format!(
                "key '{key}' of {} cannot be undefined",
                label(self)
            )));
        }
        if !def.accepts(&value) {
            return Err(type_error(key, &def, &value));
        }
        check_adoptable(self, &value)?;
        let old = self
            .node
            .state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.clone());
        if let Some(old) = old.filter(|old| *old != value) {
            detach(self, &old);
        }
        attach(self, &value, key);
        self.notify(Some(key.to_string()), EventKind::Changed);
        Ok(())
    }

    fn to_default_value(&self) -> Value {
        Value::Object(Object::new())
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        Err(SprogError::Structural(format!(
            "cannot remove key '{key}' from {}",
            label(self)
        )))
    }
}

impl fmt::Debug for StructContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_handle(&self.node.core, "StructContainer", f)
    }
}
