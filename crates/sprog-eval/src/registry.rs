//! Operation registry.

use crate::flow::Flow;
use crate::ops;
use crate::scope::Scope;
use sprog_types::Result;
use super_values::Object;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Parameters of a node: the node record without its discriminator.
pub type Params = Object;

/// An operation receives the scope it runs in and its raw parameters.
/// Parameters are resolved by the operation itself, so it decides what is
/// evaluated and when.
pub type Operation = Rc<dyn Fn(&Scope, &Params) -> Result<Flow>>;

/// Immutable name → operation table. Build one with [`RegistryBuilder`].
#[derive(Clone, Default)]
pub struct Registry {
    ops: HashMap<String, Operation>,
}

impl Registry {
    /// The base vocabulary.
    pub fn standard() -> Self {
        RegistryBuilder::standard().build()
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.ops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    ops: HashMap<String, Operation>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with the base vocabulary.
    pub fn standard() -> Self {
        let mut builder = Self::new();
        ops::register_base(&mut builder);
        builder
    }

    /// Add or replace an operation.
    pub fn register(
        mut self,
        name: impl Into<String>,
        op: impl Fn(&Scope, &Params) -> Result<Flow> + 'static,
    ) -> Self {
        self.insert(name, op);
        self
    }

    pub(crate) fn insert(
        &mut self,
        name: impl Into<String>,
        op: impl Fn(&Scope, &Params) -> Result<Flow> + 'static,
    ) {
        self.ops.insert(name.into(), Rc::new(op));
    }

    pub fn build(self) -> Registry {
        Registry { ops: self.ops }
    }
}

/// An operation tied to a scope, ready to run with parameters.
#[derive(Clone)]
pub struct BoundOperation {
    name: String,
    scope: Scope,
    op: Operation,
}

impl BoundOperation {
    pub(crate) fn new(name: &str, scope: Scope, op: Operation) -> Self {
        Self {
            name: name.to_string(),
            scope,
            op,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, params: &Params) -> Result<Flow> {
        (self.op)(&self.scope, params)
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundOperation({})", self.name)
    }
}
