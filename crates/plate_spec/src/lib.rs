//! # plate_spec
//!
//! The variable-specification and resolution engine behind `plate`.
//!
//! A template's configurable variables are described by a [`Collection`]:
//! ordered sections of typed variables. This crate builds that collection
//! from versioned schema layers, decides which sections are active, merges
//! values from four precedence layers and validates the result.
//!
//! ## Pipeline
//!
//! 1. [`SchemaResolver`] replays a module's [`SchemaDefinition`] up to the
//!    template's declared schema version.
//! 2. [`Collection::merge`] applies the template's own `spec` block.
//! 3. [`ActivationEngine`] computes the active sections from known values.
//! 4. [`PrecedenceResolver`] picks one raw value per active variable.
//! 5. [`Validator`] coerces and checks every value, reporting all failures.
//!
//! ## Example
//!
//! ```rust
//! use plate_spec::{
//!     ActivationEngine, Collection, Layer, PrecedenceResolver, SchemaVersion, Section,
//!     Validator, ValueLayers, Variable,
//! };
//!
//! let collection = Collection::new(SchemaVersion::V1_0).with_section(
//!     Section::new("general")
//!         .required()
//!         .with_var(Variable::new("timezone").with_default("UTC")),
//! );
//!
//! let layers = ValueLayers::new()
//!     .with(Layer::ModuleDefault, "timezone", "UTC")
//!     .with(Layer::TemplateOverride, "timezone", "America/New_York");
//!
//! let known = PrecedenceResolver::known_values(&collection, &layers);
//! let activation = ActivationEngine::activate(&collection, &known).unwrap();
//! let resolved = PrecedenceResolver::resolve(&collection, &activation, &layers);
//! let map = Validator::validate_all(&collection, &activation, &resolved).unwrap();
//!
//! assert_eq!(map.get("timezone").and_then(|v| v.as_str()), Some("America/New_York"));
//! ```

pub mod activation;
pub mod collection;
pub mod error;
pub mod ordered;
pub mod precedence;
pub mod resolved;
pub mod schema;
pub mod section;
pub mod validator;
pub mod value;
pub mod variable;

pub use activation::{Activation, ActivationEngine};
pub use collection::Collection;
pub use error::{
    SpecError, SpecResult, ValidationErrors, ValidationFailure, VariableValidationError,
};
pub use ordered::OrderedMap;
pub use precedence::{Layer, PrecedenceResolver, Resolved, ResolvedValues, ValueLayers};
pub use resolved::ResolvedVariableMap;
pub use schema::{
    AddSection, AddVariable, LayerOp, OverrideSection, OverrideVariable, SchemaDefinition,
    SchemaLayer, SchemaResolver, SchemaVersion,
};
pub use section::{Section, SectionPatch};
pub use validator::{parse_bool, Validator};
pub use value::{RawValue, TypedValue, MASK};
pub use variable::{Variable, VariablePatch, VariableType};
