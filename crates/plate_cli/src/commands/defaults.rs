//! Defaults command - Manage saved per-module variable defaults.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::warn;

use plate_core::{ConfigStore, ModuleRegistry, Pipeline};

use super::{parse_scalar, ArgumentError, GlobalOptions};

#[derive(Args)]
pub struct DefaultsArgs {
    #[command(subcommand)]
    command: DefaultsCommand,
}

#[derive(Subcommand)]
enum DefaultsCommand {
    /// Save a default value for a module variable
    Set {
        /// Module name
        module: String,
        /// Variable name
        variable: String,
        /// Value, parsed as a YAML scalar
        value: String,
    },

    /// List saved defaults of a module
    List {
        /// Module name
        module: String,
    },

    /// Remove a saved default
    Remove {
        /// Module name
        module: String,
        /// Variable name
        variable: String,
    },
}

pub fn execute(args: DefaultsArgs, options: &GlobalOptions) -> Result<()> {
    let registry = ModuleRegistry::builtin()?;
    let mut store = ConfigStore::load(options.config.as_deref())?;

    match args.command {
        DefaultsCommand::Set {
            module,
            variable,
            value,
        } => {
            let Some(definition) = registry.get(&module) else {
                return Err(ArgumentError(format!("unknown module '{}'", module)).into());
            };
            let collection = Pipeline::module_collection(definition.as_ref())?;
            let display = match collection.variable(&variable) {
                Some(var) => var.display_value(&value),
                None => {
                    warn!(
                        "Variable '{}' is not defined by module '{}'; templates may still use it",
                        variable, module
                    );
                    value.clone()
                }
            };

            store.set_default(&module, &variable, parse_scalar(&value))?;
            println!("✅ {}.{} = {}", module, variable, display);
            println!("   Saved to {}", store.path().display());
        }
        DefaultsCommand::List { module } => {
            let defaults = store.list_defaults(&module);
            if defaults.is_empty() {
                println!("No defaults saved for '{}'", module);
                return Ok(());
            }

            let collection = match registry.get(&module) {
                Some(definition) => Some(Pipeline::module_collection(definition.as_ref())?),
                None => None,
            };
            println!("📋 Defaults for {}:", module);
            for (name, value) in defaults {
                let shown = collection
                    .as_ref()
                    .and_then(|c| c.variable(name))
                    .map(|var| var.display_value(value))
                    .unwrap_or_else(|| value.to_string());
                println!("   {:<28} {}", name, shown);
            }
        }
        DefaultsCommand::Remove { module, variable } => {
            if store.remove_default(&module, &variable)? {
                println!("✅ Removed {}.{}", module, variable);
            } else {
                println!("⚠️  No default saved for {}.{}", module, variable);
            }
        }
    }

    Ok(())
}
