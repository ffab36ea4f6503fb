//! plate CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plate_core::CoreError;
use plate_spec::SpecError;
use plate_templates::TemplateError;

mod commands;
mod output;
mod prompt;

use commands::{ArgumentError, Cli, Commands, GlobalOptions};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let options = GlobalOptions {
        config: cli.config,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::List(args) => commands::list::execute(args, &options),
        Commands::Search(args) => commands::search::execute(args, &options),
        Commands::Show(args) => commands::show::execute(args, &options),
        Commands::Generate(args) => commands::generate::execute(args, &options),
        Commands::Validate(args) => commands::validate::execute(args, &options),
        Commands::Defaults(args) => commands::defaults::execute(args, &options),
        Commands::Repo(args) => commands::repo::execute(args, &options),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// `RUST_LOG` wins over the flags. Directive targets match by prefix, so
/// `plate` covers every `plate_*` crate.
fn init_logging(verbose: bool, quiet: bool) {
    let (ours, others) = if verbose {
        ("plate=debug", "warn")
    } else if quiet {
        ("plate=error", "error")
    } else {
        ("plate=info", "warn")
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", others, ours)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Map an error to its exit code by type.
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ArgumentError>().is_some() {
        return ExitCodes::INVALID_ARGS;
    }
    if let Some(core) = e.downcast_ref::<CoreError>() {
        return match core {
            CoreError::Spec(SpecError::Validation(_)) => ExitCodes::VALIDATION_FAILURE,
            CoreError::Spec(_) | CoreError::Template(_) | CoreError::ModuleNotFound(_) => {
                ExitCodes::TEMPLATE_ERROR
            }
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    if let Some(spec) = e.downcast_ref::<SpecError>() {
        return match spec {
            SpecError::Validation(_) => ExitCodes::VALIDATION_FAILURE,
            _ => ExitCodes::TEMPLATE_ERROR,
        };
    }
    if e.downcast_ref::<TemplateError>().is_some() {
        return ExitCodes::TEMPLATE_ERROR;
    }
    ExitCodes::GENERAL_ERROR
}
