//! Generate command - Resolve variables and render a template.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use plate_core::{GenerationContext, Pipeline, RandomValueGenerator, Resolution, ResolveRequest};
use plate_templates::{PlaceholderRenderer, Renderer};

use super::{parse_vars, GlobalOptions, Session};
use crate::output::write_files;
use crate::prompt::DialoguerPrompter;

#[derive(Args)]
pub struct GenerateArgs {
    /// Module name (e.g. compose)
    module: String,

    /// Template identifier (`id` or `id.library`)
    template: String,

    /// Output directory (defaults to ./<template>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Set a variable, highest precedence (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// Do not prompt; missing values must come from defaults
    #[arg(long)]
    no_interactive: bool,

    /// Show the files that would be written without writing them
    #[arg(long)]
    dry_run: bool,

    /// Write into a non-empty output directory
    #[arg(long)]
    force: bool,
}

pub fn execute(args: GenerateArgs, options: &GlobalOptions) -> Result<()> {
    let session = Session::open(options)?;
    session.check_module(&args.module)?;

    let overrides = parse_vars(&args.vars)?;
    let generator = RandomValueGenerator::new();
    let context = GenerationContext {
        registry: &session.registry,
        resolver: &session.resolver,
        config: session.store.config(),
        generator: &generator,
    };

    let interactive = !args.no_interactive && io::stdin().is_terminal();
    let mut prompter = DialoguerPrompter::new();
    let mut request = ResolveRequest::new(&args.module, &args.template).with_overrides(overrides);
    if interactive {
        request = request.with_prompter(&mut prompter);
    }

    info!("Generating {} template: {}", args.module, args.template);
    let resolution = Pipeline::resolve(&context, request)?;
    for warning in &resolution.warnings {
        eprintln!("⚠️  {}", warning);
    }

    let renderer = PlaceholderRenderer::new();
    let files = renderer.render(&resolution.template.root, &resolution.variables)?;
    let output_dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(&resolution.template.id));

    if !options.quiet {
        print_summary(&resolution);
    }

    if args.dry_run {
        println!("📝 Dry run: {} file(s) would be written to {}", files.len(), output_dir.display());
        for file in &files {
            println!("   {}", output_dir.join(&file.path).display());
        }
        return Ok(());
    }

    let written = write_files(&output_dir, &files, args.force)?;
    println!("✅ Wrote {} file(s) to {}", written.len(), output_dir.display());

    if let Some(next_steps) = &resolution.document.metadata.next_steps {
        println!();
        println!("Next steps:");
        for line in renderer.render_content(next_steps, &resolution.variables).lines() {
            println!("   {}", line);
        }
    }

    Ok(())
}

/// Resolved values, sensitive ones masked.
pub(crate) fn print_summary(resolution: &Resolution) {
    println!(
        "📄 {} from library '{}'",
        resolution.document.metadata.name, resolution.template.library
    );
    println!("   Active sections: {}", resolution.activation.active.join(", "));
    for (name, _) in resolution.variables.iter() {
        let shown = resolution.variables.display(name).unwrap_or_default();
        println!("   {:<28} {}", name, shown);
    }
    println!();
}
