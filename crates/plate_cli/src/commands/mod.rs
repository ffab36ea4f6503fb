//! CLI command definitions.
//!
//! This module defines the command structure for the plate CLI. Each
//! subcommand lives in its own module with an `XArgs` struct and an
//! `execute` function.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;

use plate_core::{ConfigStore, ModuleRegistry};
use plate_spec::RawValue;
use plate_templates::LibraryResolver;

pub mod defaults;
pub mod generate;
pub mod list;
pub mod repo;
pub mod search;
pub mod show;
pub mod validate;

/// plate - generate configuration from template libraries
#[derive(Parser)]
#[command(name = "plate")]
#[command(version, about = "plate - generate configuration from template libraries")]
#[command(long_about = r#"
plate resolves a template's variables from module defaults, template
overrides, your saved defaults and command-line values, then renders the
template into an output directory.

COMMANDS:
  list      → List templates of one or all modules
  search    → Search templates by id, name, description or tag
  show      → Show a module's or template's variables
  generate  → Resolve variables and render a template
  validate  → Resolve and validate variables without rendering
  defaults  → Manage saved per-module defaults
  repo      → List or sync template libraries

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file
    #[arg(long, global = true, env = "PLATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List templates
    List(list::ListArgs),

    /// Search templates of a module
    Search(search::SearchArgs),

    /// Show the variables of a module or template
    Show(show::ShowArgs),

    /// Generate files from a template
    Generate(generate::GenerateArgs),

    /// Validate a template's variables without rendering
    Validate(validate::ValidateArgs),

    /// Manage saved defaults
    Defaults(defaults::DefaultsArgs),

    /// Manage template libraries
    Repo(repo::RepoArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

/// Bad command-line input.
#[derive(Error, Debug)]
#[error("Invalid argument: {0}")]
pub struct ArgumentError(pub String);

/// Configuration, libraries and modules loaded for one command.
pub struct Session {
    pub store: ConfigStore,
    pub resolver: LibraryResolver,
    pub registry: ModuleRegistry,
}

impl Session {
    pub fn open(options: &GlobalOptions) -> Result<Self> {
        let store = ConfigStore::load(options.config.as_deref())?;
        let checkouts = ConfigStore::default_checkouts_dir()?;
        let libraries = store.libraries(&checkouts)?;
        let registry = ModuleRegistry::builtin()?;
        Ok(Self {
            store,
            resolver: LibraryResolver::new(libraries),
            registry,
        })
    }

    /// Fail early with the list of known modules.
    pub fn check_module(&self, module: &str) -> Result<()> {
        if self.registry.contains(module) {
            Ok(())
        } else {
            Err(ArgumentError(format!(
                "unknown module '{}' (available: {})",
                module,
                self.registry.names().join(", ")
            ))
            .into())
        }
    }
}

/// Parse `--var key=value` arguments. Values stay text; the validator
/// coerces them to each variable's type.
pub fn parse_vars(args: &[String]) -> Result<HashMap<String, RawValue>> {
    let mut vars = HashMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ArgumentError(format!("expected key=value, got '{}'", arg)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ArgumentError(format!("empty variable name in '{}'", arg)).into());
        }
        vars.insert(key.to_string(), RawValue::text(value));
    }
    Ok(vars)
}

/// Parse a scalar the way YAML would (`8080` → integer, `true` → boolean).
pub fn parse_scalar(value: &str) -> RawValue {
    serde_yaml::from_str::<RawValue>(value).unwrap_or_else(|_| RawValue::text(value))
}

/// Whether `dir` exists and has any entry.
pub fn is_non_empty_dir(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    let mut entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    Ok(entries.next().is_some())
}
