//! List command - List templates across libraries.

use anyhow::Result;
use clap::Args;
use tracing::info;

use plate_templates::TemplateEntry;

use super::{GlobalOptions, Session};

#[derive(Args)]
pub struct ListArgs {
    /// Module to list (all modules when omitted)
    module: Option<String>,
}

pub fn execute(args: ListArgs, options: &GlobalOptions) -> Result<()> {
    let session = Session::open(options)?;

    let modules: Vec<String> = match args.module {
        Some(module) => {
            session.check_module(&module)?;
            vec![module]
        }
        None => session.registry.names().into_iter().map(String::from).collect(),
    };

    for module in &modules {
        info!("Listing templates for module: {}", module);
        let entries = session.resolver.list(module)?;
        println!("📦 {} ({} templates)", module, entries.len());
        print_entries(&entries);
        println!();
    }

    Ok(())
}

/// One line per template; shadowed entries show the identifier that reaches them.
pub(crate) fn print_entries(entries: &[TemplateEntry]) {
    if entries.is_empty() {
        println!("   (no templates)");
        return;
    }

    let width = entries.iter().map(|e| e.id.len()).max().unwrap_or(0);
    for entry in entries {
        let mut line = format!(
            "   {:<width$}  [{}]  {}",
            entry.id,
            entry.library,
            entry.metadata.name,
            width = width
        );
        if !entry.metadata.description.is_empty() {
            line.push_str(&format!(" - {}", entry.metadata.description));
        }
        if entry.metadata.draft {
            line.push_str(" (draft)");
        }
        if entry.shadowed {
            line.push_str(&format!(" (shadowed, use {})", entry.qualified_id()));
        }
        println!("{}", line);
    }
}
