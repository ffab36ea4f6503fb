//! Schema versions and layered module definitions.
//!
//! A module describes its variables as an ordered list of layers, one per
//! schema version. Each layer is a set of explicit operations applied on top
//! of the collection produced by the previous layers:
//!
//! ```yaml
//! layers:
//!   - version: "1.0"
//!     ops:
//!       - add_section:
//!           name: general
//!           required: true
//!           vars:
//!             service_name: { type: string, default: app }
//!   - version: "1.1"
//!     ops:
//!       - add_variable: { section: general, name: restart_policy, default: unless-stopped }
//!       - override_variable: { name: service_name, description: Compose service name }
//! ```
//!
//! Operations inside one layer must commute: two operations creating the same
//! thing, setting the same attribute, or touching something created in the
//! same layer are rejected as authoring errors.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::collection::Collection;
use crate::error::{SpecError, SpecResult};
use crate::section::{Section, SectionPatch};
use crate::variable::{Variable, VariablePatch};

/// A `major.minor` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const V1_0: SchemaVersion = SchemaVersion::new(1, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let major = major
            .parse()
            .map_err(|_| format!("invalid schema version '{}'", s))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid schema version '{}'", s))?;
        Ok(Self { major, minor })
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `schema: 1.1` arrives as a float, `schema: "1.1"` as a string.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u32),
            Float(f64),
            Text(String),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Int(n) => n.to_string(),
            Repr::Float(x) => x.to_string(),
            Repr::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A new section with its initial variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddSection {
    pub name: String,
    #[serde(flatten)]
    pub section: SectionPatch,
}

/// A new variable in an existing section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddVariable {
    pub section: String,
    pub name: String,
    #[serde(flatten)]
    pub variable: VariablePatch,
}

/// Attribute overrides for an existing section. Variables are not allowed here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideSection {
    pub name: String,
    #[serde(flatten)]
    pub section: SectionPatch,
}

/// Attribute overrides for an existing variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideVariable {
    pub name: String,
    #[serde(flatten)]
    pub variable: VariablePatch,
}

/// One operation inside a schema layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerOp {
    AddSection(AddSection),
    AddVariable(AddVariable),
    OverrideSection(OverrideSection),
    OverrideVariable(OverrideVariable),
}

impl LayerOp {
    fn describe(&self) -> String {
        match self {
            LayerOp::AddSection(op) => format!("add_section {}", op.name),
            LayerOp::AddVariable(op) => format!("add_variable {}.{}", op.section, op.name),
            LayerOp::OverrideSection(op) => format!("override_section {}", op.name),
            LayerOp::OverrideVariable(op) => format!("override_variable {}", op.name),
        }
    }
}

/// All operations introduced by one schema version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaLayer {
    pub version: SchemaVersion,
    /// Each op is a single-key map (`- add_section: {..}`), not a YAML tag.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub ops: Vec<LayerOp>,
}

impl SchemaLayer {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            ops: Vec::new(),
        }
    }

    pub fn op(mut self, op: LayerOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Reject operations whose outcome would depend on their order.
    pub fn check_conflicts(&self) -> SpecResult<()> {
        let location = format!("schema layer {}", self.version);
        let conflict = |op: &LayerOp, what: String| {
            SpecError::definition(location.clone(), format!("{}: {}", op.describe(), what))
        };

        let mut new_sections = HashSet::new();
        let mut new_vars = HashSet::new();
        for op in &self.ops {
            match op {
                LayerOp::AddSection(add) => {
                    if !new_sections.insert(add.name.as_str()) {
                        return Err(conflict(op, "section is added twice".into()));
                    }
                    for var in add.section.vars.keys() {
                        if !new_vars.insert(var) {
                            return Err(conflict(op, format!("variable '{}' is added twice", var)));
                        }
                    }
                }
                LayerOp::AddVariable(add) => {
                    if !new_vars.insert(add.name.as_str()) {
                        return Err(conflict(op, "variable is added twice".into()));
                    }
                }
                _ => {}
            }
        }

        let mut touched = HashSet::new();
        for op in &self.ops {
            match op {
                LayerOp::AddVariable(add) if new_sections.contains(add.section.as_str()) => {
                    return Err(conflict(
                        op,
                        format!("section '{}' is created in the same layer", add.section),
                    ));
                }
                LayerOp::OverrideSection(ov) => {
                    if new_sections.contains(ov.name.as_str()) {
                        return Err(conflict(op, "section is created in the same layer".into()));
                    }
                    for attr in ov.section.attributes() {
                        if !touched.insert(format!("section:{}:{}", ov.name, attr)) {
                            return Err(conflict(op, format!("'{}' is overridden twice", attr)));
                        }
                    }
                }
                LayerOp::OverrideVariable(ov) => {
                    if new_vars.contains(ov.name.as_str()) {
                        return Err(conflict(op, "variable is created in the same layer".into()));
                    }
                    for attr in ov.variable.attributes() {
                        if !touched.insert(format!("var:{}:{}", ov.name, attr)) {
                            return Err(conflict(op, format!("'{}' is overridden twice", attr)));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply this layer's operations to a collection.
    fn apply(&self, collection: &mut Collection) -> SpecResult<()> {
        let location = |op: &LayerOp| format!("schema layer {} ({})", self.version, op.describe());

        for op in &self.ops {
            match op {
                LayerOp::AddSection(add) => {
                    if collection.has_section(&add.name) {
                        return Err(SpecError::definition(location(op), "section already exists"));
                    }
                    for var in add.section.vars.keys() {
                        collection.ensure_unique_variable(&add.name, var)?;
                    }
                    collection.push_section(Section::from_patch(&add.name, &add.section));
                }
                LayerOp::AddVariable(add) => {
                    collection.ensure_unique_variable(&add.section, &add.name)?;
                    let section = collection.section_mut(&add.section).ok_or_else(|| {
                        SpecError::definition(location(op), format!("unknown section '{}'", add.section))
                    })?;
                    section.vars.push(Variable::from_patch(&add.name, &add.variable));
                }
                LayerOp::OverrideSection(ov) => {
                    if !ov.section.vars.is_empty() {
                        return Err(SpecError::definition(
                            location(op),
                            "use add_variable or override_variable to change variables",
                        ));
                    }
                    let section = collection.section_mut(&ov.name).ok_or_else(|| {
                        SpecError::definition(location(op), "unknown section")
                    })?;
                    section.apply_attributes(&ov.section);
                }
                LayerOp::OverrideVariable(ov) => {
                    let var = collection.variable_mut(&ov.name).ok_or_else(|| {
                        SpecError::definition(location(op), "unknown variable")
                    })?;
                    var.apply(&ov.variable);
                }
            }
        }
        Ok(())
    }
}

/// A module's complete, versioned variable definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaDefinition {
    pub layers: Vec<SchemaLayer>,
}

impl SchemaDefinition {
    pub fn new(layers: Vec<SchemaLayer>) -> Self {
        Self { layers }
    }

    /// Parse a definition from YAML and check its layering rules.
    pub fn from_yaml(source: &str) -> SpecResult<Self> {
        let definition: SchemaDefinition = serde_yaml::from_str(source)
            .map_err(|e| SpecError::definition("schema definition", e.to_string()))?;
        definition.check()?;
        Ok(definition)
    }

    /// Highest schema version this definition supports.
    pub fn max_version(&self) -> SchemaVersion {
        self.layers
            .last()
            .map(|l| l.version)
            .unwrap_or(SchemaVersion::V1_0)
    }

    /// The first layer must be 1.0, versions must strictly increase and every
    /// layer must be internally conflict-free.
    pub fn check(&self) -> SpecResult<()> {
        let Some(first) = self.layers.first() else {
            return Err(SpecError::definition("schema definition", "no layers defined"));
        };
        if first.version != SchemaVersion::V1_0 {
            return Err(SpecError::definition(
                "schema definition",
                format!("first layer must be 1.0, found {}", first.version),
            ));
        }
        for pair in self.layers.windows(2) {
            if pair[1].version <= pair[0].version {
                return Err(SpecError::definition(
                    "schema definition",
                    format!(
                        "layer {} must come after {}",
                        pair[1].version, pair[0].version
                    ),
                ));
            }
        }
        for layer in &self.layers {
            layer.check_conflicts()?;
        }
        Ok(())
    }
}

/// Builds effective collections by replaying schema layers.
pub struct SchemaResolver<'a> {
    definition: &'a SchemaDefinition,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(definition: &'a SchemaDefinition) -> Self {
        Self { definition }
    }

    /// Highest version the module supports.
    pub fn max_version(&self) -> SchemaVersion {
        self.definition.max_version()
    }

    /// Build the collection a template declaring `declared` sees.
    pub fn resolve(&self, declared: SchemaVersion) -> SpecResult<Collection> {
        let supported = self.max_version();
        if declared > supported {
            return Err(SpecError::UnsupportedSchema { declared, supported });
        }
        if declared < SchemaVersion::V1_0 {
            return Err(SpecError::definition(
                "schema",
                format!("schema versions start at 1.0, found {}", declared),
            ));
        }
        self.definition.check()?;

        let mut collection = Collection::new(declared);
        for layer in self.definition.layers.iter().take_while(|l| l.version <= declared) {
            debug!("Applying schema layer {} ({} ops)", layer.version, layer.ops.len());
            layer.apply(&mut collection)?;
        }
        collection.validate_structure()?;
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RawValue;

    const DEFINITION: &str = r#"
layers:
  - version: "1.0"
    ops:
      - add_section:
          name: general
          title: General
          required: true
          vars:
            service_name:
              default: app
            restart_policy:
              type: enum
              options: [always, unless-stopped]
              default: always
      - add_section:
          name: ports
          title: Ports
          vars:
            http_port:
              type: int
              default: 80
  - version: 1.1
    ops:
      - add_variable:
          section: general
          name: container_timezone
          default: UTC
      - override_variable:
          name: restart_policy
          default: unless-stopped
      - override_variable:
          name: http_port
          description: Host port
"#;

    #[test]
    fn test_ops_parse_from_single_key_maps() {
        let layer: SchemaLayer = serde_yaml::from_str(
            r#"
version: "1.1"
ops:
  - add_variable: { section: general, name: tz, default: UTC }
  - override_section: { name: general, title: Basics }
  - override_variable: { name: tz, type: string }
"#,
        )
        .unwrap();
        assert_eq!(layer.ops.len(), 3);
        assert!(matches!(&layer.ops[0], LayerOp::AddVariable(op) if op.name == "tz"));
        assert!(matches!(&layer.ops[1], LayerOp::OverrideSection(op) if op.name == "general"));
        assert!(matches!(&layer.ops[2], LayerOp::OverrideVariable(_)));

        let unknown = "version: \"1.0\"\nops:\n  - remove_section: { name: x }\n";
        assert!(serde_yaml::from_str::<SchemaLayer>(unknown).is_err());
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("1.1".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(1, 1));
        assert_eq!("2".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(2, 0));
        assert!("one".parse::<SchemaVersion>().is_err());
        assert!(SchemaVersion::new(1, 10) > SchemaVersion::new(1, 2));

        let versions: Vec<SchemaVersion> = serde_yaml::from_str("[1.1, '1.0', 2]").unwrap();
        assert_eq!(
            versions,
            vec![SchemaVersion::new(1, 1), SchemaVersion::V1_0, SchemaVersion::new(2, 0)]
        );
    }

    #[test]
    fn test_layers_replay_up_to_declared() {
        let definition = SchemaDefinition::from_yaml(DEFINITION).unwrap();
        let resolver = SchemaResolver::new(&definition);
        assert_eq!(resolver.max_version(), SchemaVersion::new(1, 1));

        let v10 = resolver.resolve(SchemaVersion::V1_0).unwrap();
        assert!(v10.variable("container_timezone").is_none());
        assert_eq!(
            v10.variable("restart_policy").unwrap().default,
            Some(RawValue::text("always"))
        );

        let v11 = resolver.resolve(SchemaVersion::new(1, 1)).unwrap();
        assert_eq!(
            v11.variable("restart_policy").unwrap().default,
            Some(RawValue::text("unless-stopped"))
        );
        assert_eq!(v11.variable("http_port").unwrap().description, "Host port");
        assert_eq!(v11.schema_version, SchemaVersion::new(1, 1));
    }

    #[test]
    fn test_declared_above_module_is_unsupported() {
        let definition = SchemaDefinition::from_yaml(DEFINITION).unwrap();
        let err = SchemaResolver::new(&definition)
            .resolve(SchemaVersion::new(1, 2))
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::UnsupportedSchema { declared, supported }
                if declared == SchemaVersion::new(1, 2) && supported == SchemaVersion::new(1, 1)
        ));
    }

    #[test]
    fn test_double_override_in_one_layer_is_conflict() {
        let layer = SchemaLayer::new(SchemaVersion::V1_0)
            .op(LayerOp::OverrideVariable(OverrideVariable {
                name: "port".into(),
                variable: VariablePatch {
                    default: Some(RawValue::Integer(1)),
                    ..Default::default()
                },
            }))
            .op(LayerOp::OverrideVariable(OverrideVariable {
                name: "port".into(),
                variable: VariablePatch {
                    default: Some(RawValue::Integer(2)),
                    ..Default::default()
                },
            }));
        assert!(matches!(
            layer.check_conflicts(),
            Err(SpecError::SchemaDefinition { .. })
        ));
    }

    #[test]
    fn test_overrides_of_different_attributes_commute() {
        let layer = SchemaLayer::new(SchemaVersion::V1_0)
            .op(LayerOp::OverrideVariable(OverrideVariable {
                name: "port".into(),
                variable: VariablePatch {
                    default: Some(RawValue::Integer(1)),
                    ..Default::default()
                },
            }))
            .op(LayerOp::OverrideVariable(OverrideVariable {
                name: "port".into(),
                variable: VariablePatch {
                    description: Some("Port".into()),
                    ..Default::default()
                },
            }));
        layer.check_conflicts().unwrap();
    }

    #[test]
    fn test_touching_same_layer_creation_is_conflict() {
        let source = r#"
layers:
  - version: "1.0"
    ops:
      - add_section: { name: general }
      - add_variable: { section: general, name: x }
"#;
        let err = SchemaDefinition::from_yaml(source).unwrap_err();
        assert!(err.to_string().contains("same layer"));
    }

    #[test]
    fn test_adding_existing_variable_fails() {
        let source = r#"
layers:
  - version: "1.0"
    ops:
      - add_section: { name: general, vars: { x: {} } }
  - version: "1.1"
    ops:
      - add_variable: { section: general, name: x }
"#;
        let definition = SchemaDefinition::from_yaml(source).unwrap();
        let resolver = SchemaResolver::new(&definition);
        resolver.resolve(SchemaVersion::V1_0).unwrap();
        assert!(resolver.resolve(SchemaVersion::new(1, 1)).is_err());
    }

    #[test]
    fn test_layers_must_start_at_one_and_increase() {
        let source = r#"
layers:
  - version: "1.1"
"#;
        assert!(SchemaDefinition::from_yaml(source).is_err());

        let source = r#"
layers:
  - version: "1.0"
  - version: "1.0"
"#;
        assert!(SchemaDefinition::from_yaml(source).is_err());
    }
}
