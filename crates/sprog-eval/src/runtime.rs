//! Entry point for hosts.

use crate::flow::Flow;
use crate::host::HostEvaluator;
use crate::registry::{Params, RegistryBuilder};
use crate::scope::{Env, Scope};
use crate::stdlib;
use sprog_types::{Result, RuntimeConfig};
use super_values::{Object, Value};
use std::rc::Rc;

/// A configured runtime: operation registry, standard library, reserved
/// names and the optional host evaluator. Cheap to clone.
#[derive(Clone)]
pub struct Runtime {
    env: Rc<Env>,
}

impl Runtime {
    /// Default configuration, base vocabulary, no host evaluator.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.env.config
    }

    /// A root scope seeded with `vars`.
    pub fn root_scope(&self, vars: Object) -> Result<Scope> {
        Scope::new_scope(self.env.clone(), vars, None)
    }

    /// Run a program in a fresh root scope.
    pub fn run(&self, program: &serde_json::Value) -> Result<Value> {
        let scope = self.root_scope(Object::new())?;
        self.run_in(&scope, program)
    }

    /// Run a program in `scope`.
    ///
    /// An array is a list of lines: the result is the value of the first
    /// `return`, or `undefined`. Anything else is resolved as one value.
    pub fn run_in(&self, scope: &Scope, program: &serde_json::Value) -> Result<Value> {
        let program = Value::from(program.clone());
        match &program {
            Value::Array(lines) => Ok(match scope.run_lines(lines)? {
                Flow::Return(value) | Flow::Normal(value) => value,
                Flow::Break | Flow::Continue => Value::Undefined,
            }),
            other => scope.resolve(other),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    host: Option<Rc<dyn HostEvaluator>>,
    registry: Option<RegistryBuilder>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: Rc<dyn HostEvaluator>) -> Self {
        self.host = Some(host);
        self
    }

    /// Add an operation, or replace a base one of the same name.
    pub fn operation(
        mut self,
        name: impl Into<String>,
        op: impl Fn(&Scope, &Params) -> Result<Flow> + 'static,
    ) -> Self {
        let registry = self.registry.take().unwrap_or_else(RegistryBuilder::standard);
        self.registry = Some(registry.register(name, op));
        self
    }

    pub fn build(self) -> Runtime {
        let registry = self
            .registry
            .unwrap_or_else(RegistryBuilder::standard)
            .build();
        tracing::debug!(
            ops = registry.names().len(),
            host = self.host.is_some(),
            "runtime built"
        );
        Runtime {
            env: Rc::new(Env {
                config: self.config,
                registry,
                host: self.host,
                library: stdlib::library(),
            }),
        }
    }
}
