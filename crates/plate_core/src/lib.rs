//! # plate_core
//!
//! Generation pipeline for plate.
//!
//! This crate ties the variable engine ([`plate_spec`]) to template libraries
//! ([`plate_templates`]):
//!
//! - **Modules**: technology modules (`compose`, `kubernetes`) owning a
//!   layered variable schema, kept in a [`ModuleRegistry`]
//! - **Configuration**: libraries and per-module defaults in [`ConfigStore`]
//! - **Pipeline**: [`Pipeline::resolve`] runs a template from library lookup
//!   to validated variables
//! - **Collaborators**: [`Prompter`] for interactive answers and
//!   [`ValueGenerator`] for autogenerated values
//!
//! # Example
//!
//! ```rust,no_run
//! use plate_core::{
//!     ConfigStore, GenerationContext, ModuleRegistry, Pipeline, RandomValueGenerator,
//!     ResolveRequest,
//! };
//! use plate_templates::LibraryResolver;
//!
//! # fn main() -> Result<(), plate_core::CoreError> {
//! let store = ConfigStore::load(None)?;
//! let libraries = store.libraries(&ConfigStore::default_checkouts_dir()?)?;
//! let resolver = LibraryResolver::new(libraries);
//! let registry = ModuleRegistry::builtin()?;
//! let generator = RandomValueGenerator::new();
//!
//! let context = GenerationContext {
//!     registry: &registry,
//!     resolver: &resolver,
//!     config: store.config(),
//!     generator: &generator,
//! };
//! let request = ResolveRequest::new("compose", "nginx").with_override("service_name", "web");
//! let resolution = Pipeline::resolve(&context, request)?;
//!
//! for (name, value) in resolution.variables.iter() {
//!     println!("{} = {}", name, value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod module;
pub mod pipeline;
pub mod prompt;

pub use config::{ConfigStore, UserConfig, DEFAULT_LIBRARY, DEFAULT_LIBRARY_URL};
pub use error::{CoreError, CoreResult};
pub use generate::{RandomValueGenerator, ValueGenerator};
pub use module::{DefinitionModule, Module, ModuleRegistry};
pub use pipeline::{GenerationContext, Pipeline, Resolution, ResolveRequest};
pub use prompt::{Prompter, ScriptedPrompter};
