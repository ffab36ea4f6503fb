//! Precedence resolution across the four value layers.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::activation::Activation;
use crate::collection::Collection;
use crate::value::RawValue;

/// A value source, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    ModuleDefault,
    TemplateOverride,
    UserConfig,
    CliOverride,
}

impl Layer {
    /// All layers from highest to lowest precedence.
    pub const BY_PRECEDENCE: [Layer; 4] = [
        Layer::CliOverride,
        Layer::UserConfig,
        Layer::TemplateOverride,
        Layer::ModuleDefault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::ModuleDefault => "module default",
            Layer::TemplateOverride => "template",
            Layer::UserConfig => "user config",
            Layer::CliOverride => "cli",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw values each layer supplies, keyed by variable name.
#[derive(Debug, Clone, Default)]
pub struct ValueLayers {
    pub module_defaults: HashMap<String, RawValue>,
    pub template_overrides: HashMap<String, RawValue>,
    pub user_config: HashMap<String, RawValue>,
    pub cli_overrides: HashMap<String, RawValue>,
}

impl ValueLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: Layer) -> &HashMap<String, RawValue> {
        match layer {
            Layer::ModuleDefault => &self.module_defaults,
            Layer::TemplateOverride => &self.template_overrides,
            Layer::UserConfig => &self.user_config,
            Layer::CliOverride => &self.cli_overrides,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut HashMap<String, RawValue> {
        match layer {
            Layer::ModuleDefault => &mut self.module_defaults,
            Layer::TemplateOverride => &mut self.template_overrides,
            Layer::UserConfig => &mut self.user_config,
            Layer::CliOverride => &mut self.cli_overrides,
        }
    }

    pub fn with(mut self, layer: Layer, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.layer_mut(layer).insert(name.into(), value.into());
        self
    }

    /// Highest-precedence value for a name. Presence decides, not emptiness:
    /// an empty string from the CLI still beats a module default.
    pub fn lookup(&self, name: &str) -> Option<(&RawValue, Layer)> {
        Layer::BY_PRECEDENCE
            .iter()
            .find_map(|layer| self.layer(*layer).get(name).map(|v| (v, *layer)))
    }

    /// Names supplied by any layer that the collection does not declare.
    pub fn unknown_names(&self, collection: &Collection) -> Vec<String> {
        let mut unknown: Vec<String> = Layer::BY_PRECEDENCE
            .iter()
            .flat_map(|layer| self.layer(*layer).keys())
            .filter(|name| collection.variable(name).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }
}

/// Resolution outcome for one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value { value: RawValue, source: Layer },
    /// Autogenerated variable with no supplied value; filled in externally
    /// before validation.
    PendingGeneration,
    /// Value produced by the autogeneration collaborator.
    Generated { value: RawValue },
    /// No layer supplied a value.
    Unset,
}

impl Resolved {
    pub fn value(&self) -> Option<&RawValue> {
        match self {
            Resolved::Value { value, .. } | Resolved::Generated { value } => Some(value),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<Layer> {
        match self {
            Resolved::Value { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Resolved raw values for the variables of active sections, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    entries: Vec<(String, Resolved)>,
}

impl ResolvedValues {
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variables waiting on the autogeneration collaborator.
    pub fn pending_generation(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| *r == Resolved::PendingGeneration)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Replace a pending marker with a generated value.
    pub fn fill_generated(&mut self, name: &str, value: RawValue) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, resolved @ Resolved::PendingGeneration)) => {
                *resolved = Resolved::Generated { value };
                true
            }
            _ => false,
        }
    }
}

/// Merges the value layers into one raw value per variable.
pub struct PrecedenceResolver;

impl PrecedenceResolver {
    /// Resolve every variable of every active section. Variables of inactive
    /// sections are left out entirely.
    pub fn resolve(
        collection: &Collection,
        activation: &Activation,
        layers: &ValueLayers,
    ) -> ResolvedValues {
        for name in layers.unknown_names(collection) {
            warn!("Ignoring value for unknown variable '{}'", name);
        }

        let mut entries = Vec::new();
        for (section, var) in collection.variables() {
            if !activation.is_active(&section.name) {
                continue;
            }
            let resolved = match layers.lookup(&var.name) {
                Some((value, source)) => {
                    debug!("{} <- {}", var.name, source);
                    Resolved::Value {
                        value: value.clone(),
                        source,
                    }
                }
                None if var.autogenerated => Resolved::PendingGeneration,
                None => Resolved::Unset,
            };
            entries.push((var.name.clone(), resolved));
        }
        ResolvedValues { entries }
    }

    /// Highest-precedence value of every declared variable, ignoring
    /// activation. This is what the activation engine sees as "known".
    pub fn known_values(collection: &Collection, layers: &ValueLayers) -> HashMap<String, RawValue> {
        collection
            .variables()
            .filter_map(|(_, var)| {
                layers
                    .lookup(&var.name)
                    .map(|(value, _)| (var.name.clone(), value.clone()))
            })
            .collect()
    }
}
