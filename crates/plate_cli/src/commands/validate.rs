//! Validate command - Resolve a template's variables without rendering.

use anyhow::Result;
use clap::Args;

use plate_core::{GenerationContext, Pipeline, RandomValueGenerator, ResolveRequest};

use super::generate::print_summary;
use super::{parse_vars, GlobalOptions, Session};

#[derive(Args)]
pub struct ValidateArgs {
    /// Module name
    module: String,

    /// Template identifier (`id` or `id.library`)
    template: String,

    /// Set a variable, highest precedence (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
}

pub fn execute(args: ValidateArgs, options: &GlobalOptions) -> Result<()> {
    let session = Session::open(options)?;
    session.check_module(&args.module)?;

    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &session.registry,
        resolver: &session.resolver,
        config: session.store.config(),
        generator: &generator,
    };
    let request =
        ResolveRequest::new(&args.module, &args.template).with_overrides(parse_vars(&args.vars)?);

    println!("📋 Validating {} template: {}", args.module, args.template);
    let resolution = Pipeline::resolve(&context, request).inspect_err(|e| {
        if let Some(errors) = e.validation_errors() {
            println!("❌ {} variable(s) failed validation", errors.len());
        }
    })?;

    for warning in &resolution.warnings {
        eprintln!("⚠️  {}", warning);
    }
    if !options.quiet {
        print_summary(&resolution);
    }
    println!("✅ {} variable(s) valid", resolution.variables.len());
    Ok(())
}
