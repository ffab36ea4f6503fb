//! Technology modules and the module registry.
//!
//! A module owns the layered variable schema shared by all of its templates.
//! Built-in modules are enumerated explicitly in [`ModuleRegistry::builtin`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use plate_spec::{SchemaDefinition, SchemaVersion};

use crate::error::{CoreError, CoreResult};

const COMPOSE_SCHEMA: &str = include_str!("../modules/compose.yaml");
const KUBERNETES_SCHEMA: &str = include_str!("../modules/kubernetes.yaml");

/// A technology module that templates plug into.
pub trait Module: Send + Sync {
    /// Unique module name, matching template `kind`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Layered schema definition.
    fn schema(&self) -> &SchemaDefinition;

    /// Highest schema version this module supports.
    fn schema_version(&self) -> SchemaVersion {
        self.schema().max_version()
    }
}

/// A module defined by a layered YAML schema.
#[derive(Debug, Clone)]
pub struct DefinitionModule {
    name: String,
    description: String,
    schema: SchemaDefinition,
}

impl DefinitionModule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: SchemaDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Parse and check a layered schema definition.
    pub fn from_yaml(
        name: impl Into<String>,
        description: impl Into<String>,
        source: &str,
    ) -> CoreResult<Self> {
        let name = name.into();
        let schema = SchemaDefinition::from_yaml(source).map_err(|source| {
            CoreError::InvalidModule {
                module: name.clone(),
                source,
            }
        })?;
        Ok(Self::new(name, description, schema))
    }
}

impl Module for DefinitionModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }
}

/// A registry of modules keyed by name.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Registry with every built-in module.
    pub fn builtin() -> CoreResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(DefinitionModule::from_yaml(
            "compose",
            "Docker Compose services",
            COMPOSE_SCHEMA,
        )?));
        registry.register(Arc::new(DefinitionModule::from_yaml(
            "kubernetes",
            "Kubernetes manifests",
            KUBERNETES_SCHEMA,
        )?));
        Ok(registry)
    }

    /// Register a module under its `name()`, replacing any previous one.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        let name = module.name().to_string();
        debug!("Registering module: {}", name);
        self.modules.insert(name, module);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    /// Get a module by name, returning an error if not found.
    pub fn get_required(&self, name: &str) -> CoreResult<Arc<dyn Module>> {
        self.get(name)
            .ok_or_else(|| CoreError::ModuleNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}
