//! Lexical scopes.
//!
//! A scope is one map container per frame. A child frame is layered on its
//! parent's map, so lookups and assignments of variables the child never
//! declared reach the enclosing frames. Every frame carries the standard
//! library under the configured library key as a readonly binding.

use crate::flow::Flow;
use crate::host::HostEvaluator;
use crate::registry::{BoundOperation, Registry};
use indexmap::IndexMap;
use sprog_types::path::split_path;
use sprog_types::{Result, RuntimeConfig, SprogError};
use super_values::{ItemDefinition, MapContainer, Object, ReactiveContainer, Value};
use std::fmt;
use std::rc::Rc;

/// State shared by every scope of one runtime.
pub(crate) struct Env {
    pub(crate) config: RuntimeConfig,
    pub(crate) registry: Registry,
    pub(crate) host: Option<Rc<dyn HostEvaluator>>,
    pub(crate) library: Value,
}

#[derive(Clone)]
pub struct Scope {
    vars: MapContainer,
    env: Rc<Env>,
}

impl Scope {
    /// Fresh frame seeded with `initial`, layered on `previous` if given.
    pub(crate) fn new_scope(env: Rc<Env>, initial: Object, previous: Option<&Scope>) -> Result<Self> {
        let mut defs = IndexMap::new();
        defs.insert(
            env.config.library_key.clone(),
            ItemDefinition::any()
                .readonly()
                .with_default(env.library.clone()),
        );
        // Frames reference containers; ownership stays with the data they came from.
        let vars = match previous {
            Some(parent) => MapContainer::layered(defs, &parent.vars),
            None => MapContainer::new(defs),
        }
        .non_owning();
        vars.init(Some(initial))?;
        tracing::debug!(frame = vars.id(), nested = previous.is_some(), "scope created");
        Ok(Self { vars, env })
    }

    /// Child frame of this scope.
    pub fn child(&self, initial: Object) -> Result<Scope> {
        Self::new_scope(self.env.clone(), initial, Some(self))
    }

    /// This frame's variables.
    pub fn vars(&self) -> &MapContainer {
        &self.vars
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.env.config
    }

    pub fn registry(&self) -> &Registry {
        &self.env.registry
    }

    pub(crate) fn host(&self) -> Option<&Rc<dyn HostEvaluator>> {
        self.env.host.as_ref()
    }

    // ── evaluation ──────────────────────────────────────────────────────

    /// The node record, if `value` is one.
    pub fn as_node<'a>(&self, value: &'a Value) -> Option<&'a Object> {
        match value {
            Value::Object(record)
                if matches!(record.get(&self.env.config.marker), Some(Value::String(_))) =>
            {
                Some(record)
            }
            _ => None,
        }
    }

    pub fn is_node(&self, value: &Value) -> bool {
        self.as_node(value).is_some()
    }

    /// Evaluate `value` if it is a node; otherwise return it unchanged.
    pub fn resolve(&self, value: &Value) -> Result<Value> {
        match self.as_node(value) {
            Some(node) => Ok(self.run(node)?.into_value()),
            None => Ok(value.clone()),
        }
    }

    /// Like [`Scope::resolve`], but also resolves nodes nested in plain
    /// arrays and objects. Never looks inside a node's own parameters.
    pub fn resolve_deep(&self, value: &Value) -> Result<Value> {
        if let Some(node) = self.as_node(value) {
            return Ok(self.run(node)?.into_value());
        }
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_deep(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(record) => record
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.resolve_deep(v)?)))
                .collect::<Result<Object>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    /// Run one node.
    pub fn run(&self, node: &Object) -> Result<Flow> {
        let name = self.node_name(node)?;
        let op = self
            .env
            .registry
            .get(name)
            .ok_or_else(|| SprogError::UnknownExpression(name.to_string()))?;
        let mut params = node.clone();
        params.shift_remove(&self.env.config.marker);
        tracing::trace!(op = name, "run");
        op(self, &params)
    }

    /// Look up an operation and tie it to this scope without running it.
    pub fn bind(&self, name: &str) -> Result<BoundOperation> {
        let op = self
            .env
            .registry
            .get(name)
            .ok_or_else(|| SprogError::UnknownExpression(name.to_string()))?;
        Ok(BoundOperation::new(name, self.clone(), op.clone()))
    }

    /// Run one line: nodes are run, anything else is its own result.
    pub fn run_line(&self, line: &Value) -> Result<Flow> {
        match self.as_node(line) {
            Some(node) => self.run(node),
            None => Ok(Flow::Normal(line.clone())),
        }
    }

    /// Run lines in order, stopping at the first control outcome.
    pub fn run_lines(&self, lines: &[Value]) -> Result<Flow> {
        for line in lines {
            match self.run_line(line)? {
                Flow::Normal(_) => {}
                control => return Ok(control),
            }
        }
        Ok(Flow::undefined())
    }

    fn node_name<'a>(&self, node: &'a Object) -> Result<&'a str> {
        node.get(&self.env.config.marker)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SprogError::UnknownExpression(format!(
                    "node has no '{}' discriminator",
                    self.env.config.marker
                ))
            })
    }

    // ── variables ───────────────────────────────────────────────────────

    pub fn get(&self, path: &str) -> Result<Value> {
        self.vars.get_value(path)
    }

    /// Assign through the frame chain; unknown variables land in this frame.
    pub fn set(&self, path: &str, value: Value) -> Result<()> {
        self.vars.set_value(path, value)
    }

    /// Declare a variable in this frame, shadowing any outer one.
    pub fn declare(
        &self,
        name: &str,
        definition: Option<ItemDefinition>,
        value: Option<Value>,
    ) -> Result<()> {
        self.vars.define(name, definition, value)
    }

    /// Remove the value at `path`.
    ///
    /// A container parent drops the key through its own removal (maps
    /// forget it in every layer); a plain parent is rebuilt without it.
    pub fn delete(&self, path: &str) -> Result<()> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(SprogError::UnknownPath(path.to_string()));
        };
        if parents.is_empty() {
            return self.vars.forget(last);
        }
        let parent = self.vars.get_path(parents)?;
        if let Some(container) = parent.as_container() {
            return container.remove_key(last);
        }
        let pruned = match parent {
            Value::Object(mut record) => {
                record.shift_remove(last.as_str());
                Value::Object(record)
            }
            Value::Array(mut items) => {
                match last.parse::<usize>() {
                    Ok(index) if index < items.len() => {
                        items.remove(index);
                    }
                    _ => {}
                }
                Value::Array(items)
            }
            Value::Undefined => return Ok(()),
            other => {
                return Err(SprogError::UnknownPath(format!(
                    "cannot delete '{path}': parent is a {}",
                    other.type_name()
                )))
            }
        };
        self.vars.set_path(parents, pruned)
    }

    /// Plain copies of the variables declared in this frame, without the
    /// library binding and without anything inherited.
    pub fn clone_own_vars(&self) -> Object {
        self.vars
            .my_keys()
            .into_iter()
            .filter(|key| *key != self.env.config.library_key)
            .map(|key| {
                let value = self.vars.get_own_value(&key).to_plain();
                (key, value)
            })
            .collect()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("vars", &self.vars).finish()
    }
}

