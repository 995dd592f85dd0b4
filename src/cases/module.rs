#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Student "modules": named collections of functions a check can look up.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;
use thiserror::Error;

use crate::harness::Console;

/// A function exposed by a module. It receives the console of the running
/// check and its arguments.
pub type Function = Arc<dyn Fn(&mut Console, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Errors raised while resolving modules.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No module with this name was registered.
    #[error("No module named '{0}'")]
    NotFound(String),
}

/// A named set of functions.
#[derive(Clone, Default)]
pub struct Module {
    /// Module name.
    name:      String,
    /// Functions by name.
    functions: BTreeMap<String, Function>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:      name.into(),
            functions: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a function.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&mut Console, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Returns the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a function by name.
    pub fn lookup(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Returns the names of all functions, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Returns a module holding the functions of both; `other` wins on name
    /// clashes.
    pub fn merged_with(&self, other: &Module) -> Module {
        let mut functions = self.functions.clone();
        functions.extend(
            other
                .functions
                .iter()
                .map(|(name, f)| (name.clone(), Arc::clone(f))),
        );

        Module {
            name: other.name.clone(),
            functions,
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of importable modules.
#[derive(Clone, Default, Debug)]
pub struct Modules {
    /// Modules by name.
    modules: BTreeMap<String, Module>,
}

impl Modules {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a module under its own name.
    pub fn register(mut self, module: Module) -> Self {
        self.modules.insert(module.name.clone(), module);
        self
    }

    /// Resolves a module by name.
    pub fn import(&self, name: &str) -> Result<&Module, ModuleError> {
        self.modules
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }
}
