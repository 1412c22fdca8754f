//! Keyed, extensible container with optional layering.

use super::{
    attach, begin_init, check_adoptable, debug_handle, detach, finish_init, handler, label,
    type_error, Container, ContainerKind, Core, EventKind, Node, PrivilegedSetter,
    ReactiveContainer, SubscriptionId, WriteMode,
};
use crate::definition::{check_definition, ItemDefinition};
use crate::value::{Object, Value};
use indexmap::IndexMap;
use sprog_types::{Result, SprogError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Definition key naming the fallback for undeclared keys.
pub const DEFAULT_DEFINITION_KEY: &str = "$DEFAULT";

pub(crate) struct MapState {
    values: IndexMap<String, Value>,
    definitions: IndexMap<String, ItemDefinition>,
    fallback: ItemDefinition,
    bottom: Option<MapContainer>,
    bottom_subscription: Option<SubscriptionId>,
}

/// String-keyed container ("data").
///
/// Keys come from the definitions given at construction plus any key
/// introduced later through [`MapContainer::define`] or a plain `set_value`.
/// A map may sit on a bottom layer: keys it does not own are read from and
/// written to that layer, and the layer's changes to such keys are
/// re-emitted here.
#[derive(Clone)]
pub struct MapContainer {
    pub(crate) node: Rc<Node<MapState>>,
}

impl MapContainer {
    pub fn new(mut definitions: IndexMap<String, ItemDefinition>) -> Self {
        let fallback = definitions
            .shift_remove(DEFAULT_DEFINITION_KEY)
            .unwrap_or_default();
        Self {
            node: Node::new(
                ContainerKind::Data,
                MapState {
                    values: IndexMap::new(),
                    definitions,
                    fallback,
                    bottom: None,
                    bottom_subscription: None,
                },
            ),
        }
    }

    /// Map with no declared keys.
    pub fn empty() -> Self {
        Self::new(IndexMap::new())
    }

    /// Map that falls back to `bottom` for keys it does not own.
    pub fn layered(definitions: IndexMap<String, ItemDefinition>, bottom: &MapContainer) -> Self {
        let map = Self::new(definitions);
        let top = Rc::downgrade(&map.node);
        let bottom_id = bottom.id();
        let sub = bottom.subscribe(handler(move |event| {
            if event.source.id() != bottom_id {
                return;
            }
            let Some(top) = top.upgrade().map(|node| MapContainer { node }) else {
                return;
            };
            let Some(key) = &event.path else {
                return;
            };
            if !top.is_initialized() || top.is_destroyed() || top.owns_key(key) {
                return;
            }
            top.notify(Some(key.clone()), event.kind.clone());
        }));
        {
            let mut state = map.node.state.borrow_mut();
            state.bottom = Some(bottom.clone());
            state.bottom_subscription = Some(sub);
        }
        map
    }

    /// Stop this map from taking ownership of container values stored in
    /// it. Such values keep their current owner, path and event route, and
    /// are not destroyed with this map.
    pub fn non_owning(self) -> Self {
        self.node.core.borrow_mut().adopts = false;
        self
    }

    pub fn bottom_layer(&self) -> Option<MapContainer> {
        self.node.state.borrow().bottom.clone()
    }

    /// Whether `key` is held by this layer itself.
    pub fn owns_key(&self, key: &str) -> bool {
        self.node.state.borrow().values.contains_key(key)
    }

    /// Effective definition of `key`, looking through the layers.
    pub fn definition(&self, key: &str) -> Option<ItemDefinition> {
        let bottom = {
            let state = self.node.state.borrow();
            if let Some(def) = state.definitions.get(key) {
                return Some(def.clone());
            }
            state.bottom.clone()
        };
        bottom.and_then(|b| b.definition(key))
    }

    /// Set every declared key, define every extra initial key with the
    /// fallback definition, then check required keys.
    ///
    /// All values are validated before any is stored.
    pub fn init(&self, initial: Option<Object>) -> Result<PrivilegedSetter> {
        begin_init(self)?;
        let mut initial = initial.unwrap_or_default();
        let mut staged: Vec<(String, Value)> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        let (declared, fallback) = {
            let state = self.node.state.borrow();
            (state.definitions.clone(), state.fallback.clone())
        };

        for (key, def) in &declared {
            let supplied = initial
                .shift_remove(key)
                .filter(|value| !value.is_undefined());
            let value = match supplied {
                Some(value) => Some(value),
                None => def.initial_value()?,
            };
            match value {
                Some(value) => {
                    validate(self, key, def, &value)?;
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
        let mut extra = Vec::new();
        for (key, value) in initial {
            if value.is_undefined() {
                continue;
            }
            validate(self, &key, &fallback, &value)?;
            extra.push(key.clone());
            staged.push((key, value));
        }

        {
            let mut state = self.node.state.borrow_mut();
            for key in extra {
                state.definitions.insert(key, fallback.clone());
            }
            for (key, value) in &staged {
                state.values.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &staged {
            attach(self, value, key);
        }
        Ok(finish_init(self))
    }

    /// Add a new own key. Fails if this layer already owns `key`.
    ///
    /// Without a definition the fallback definition is used; without an
    /// initial value the definition's default (or zero value) is.
    pub fn define(
        &self,
        key: &str,
        definition: Option<ItemDefinition>,
        initial: Option<Value>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        if self.owns_key(key) {
            return Err(SprogError::Structural(format!(
                "key '{key}' is already defined in {}; forget it first",
                label(self)
            )));
        }
        let def = match definition {
            Some(def) => {
                check_definition(&def)?;
                def
            }
            None => self.node.state.borrow().fallback.clone(),
        };
        let value = match initial.filter(|v| !v.is_undefined()) {
            Some(value) => value,
            None => def.initial_value()?.ok_or_else(|| {
                SprogError::Validation(format!("required key '{key}' defined without a value"))
            })?,
        };
        validate(self, key, &def, &value)?;
        {
            let mut state = self.node.state.borrow_mut();
            state.definitions.insert(key.to_string(), def);
            state.values.insert(key.to_string(), value.clone());
        }
        attach(self, &value, key);
        tracing::debug!(container = %label(self), key, "defined");
        self.notify(Some(key.to_string()), EventKind::Defined);
        Ok(())
    }

    /// Remove `key` from this layer and every layer below it.
    pub fn forget(&self, key: &str) -> Result<()> {
        self.ensure_initialized()?;
        let (removed, bottom) = {
            let mut state = self.node.state.borrow_mut();
            state.definitions.shift_remove(key);
            (state.values.shift_remove(key), state.bottom.clone())
        };
        if let Some(bottom) = bottom {
            bottom.forget(key)?;
        }
        if let Some(old) = removed {
            detach(self, &old);
            tracing::debug!(container = %label(self), key, "forgot");
            self.notify(Some(key.to_string()), EventKind::Changed);
        }
        Ok(())
    }
}

fn validate(map: &MapContainer, key: &str, def: &ItemDefinition, value: &Value) -> Result<()> {
    if !def.accepts(value) {
        return Err(type_error(key, def, value));
    }
    check_adoptable(map, value)
}

impl ReactiveContainer for MapContainer {
    fn core(&self) -> &RefCell<Core> {
        &self.node.core
    }

    fn handle(&self) -> Container {
        Container::Data(self.clone())
    }

    fn is_key_readonly(&self, key: &str) -> bool {
        self.definition(key).is_some_and(|def| def.is_readonly())
    }

    fn my_keys(&self) -> Vec<String> {
        self.node.state.borrow().values.keys().cloned().collect()
    }

    /// Bottom-layer keys first, then keys only this layer holds.
    fn all_keys(&self) -> Vec<String> {
        let mut keys = self
            .bottom_layer()
            .map(|bottom| bottom.all_keys())
            .unwrap_or_default();
        for key in self.my_keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn has_own_key(&self, key: &str) -> bool {
        self.owns_key(key) || self.bottom_layer().is_some_and(|b| b.has_own_key(key))
    }

    fn get_own_value(&self, key: &str) -> Value {
        let bottom = {
            let state = self.node.state.borrow();
            if let Some(value) = state.values.get(key) {
                return value.clone();
            }
            state.bottom.clone()
        };
        bottom.map(|b| b.get_own_value(key)).unwrap_or_default()
    }

    fn set_own_value(&self, key: &str, value: Value, mode: WriteMode) -> Result<()> {
        self.ensure_initialized()?;
        if !self.owns_key(key) {
            if let Some(bottom) = self.bottom_layer().filter(|b| b.has_own_key(key)) {
                return bottom.set_own_value(key, value, WriteMode::Public);
            }
            return self.define(key, None, Some(value));
        }
        let def = self
            .node
            .state
            .borrow()
            .definitions
            .get(key)
            .cloned()
            .unwrap_or_default();
        if def.is_readonly() && !mode.is_privileged() {
            return Err(SprogError::Validation(format!(
                "key '{key}' of {} is readonly",
                label(self)
            )));
        }
        validate(self, key, &def, &value)?;
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
        self.forget(key)
    }

    fn release(&self) {
        let (bottom, sub) = {
            let mut state = self.node.state.borrow_mut();
            (state.bottom.clone(), state.bottom_subscription.take())
        };
        if let (Some(bottom), Some(sub)) = (bottom, sub) {
            bottom.unsubscribe(sub);
        }
    }
}

impl Drop for MapState {
    fn drop(&mut self) {
        let (Some(bottom), Some(sub)) = (&self.bottom, self.bottom_subscription.take()) else {
            return;
        };
        if let Ok(mut core) = bottom.node.core.try_borrow_mut() {
            core.subscribers.retain(|(id, _)| *id != sub);
        }
    }
}

impl fmt::Debug for MapContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_handle(&self.node.core, "MapContainer", f)
    }
}
