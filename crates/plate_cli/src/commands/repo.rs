//! Repo command - List and synchronize template libraries.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use plate_core::ConfigStore;
use plate_templates::{LibrarySource, LibrarySync};

use super::GlobalOptions;

#[derive(Args)]
pub struct RepoArgs {
    #[command(subcommand)]
    command: RepoCommand,
}

#[derive(Subcommand)]
enum RepoCommand {
    /// List configured libraries in priority order
    List,

    /// Clone or update git libraries
    Sync,
}

pub fn execute(args: RepoArgs, options: &GlobalOptions) -> Result<()> {
    let store = ConfigStore::load(options.config.as_deref())?;
    let libraries = store.libraries(&ConfigStore::default_checkouts_dir()?)?;

    match args.command {
        RepoCommand::List => {
            if libraries.is_empty() {
                println!("No libraries configured in {}", store.path().display());
                return Ok(());
            }
            println!("📚 Libraries (highest priority first):");
            for library in &libraries {
                let status = if library.is_available() { "✅" } else { "❌" };
                println!(
                    "   {} {:<16} {:<7} {}",
                    status,
                    library.name,
                    library.kind().as_str(),
                    library.root.display()
                );
                if let LibrarySource::Git { url, branch, .. } = &library.source {
                    println!("      {} ({})", url, branch);
                }
            }
        }
        RepoCommand::Sync => {
            if !LibrarySync::is_git_available() {
                bail!("git executable not found on PATH");
            }
            let reports = LibrarySync::new().sync_all(&libraries);
            let mut failed = 0;
            for report in &reports {
                let icon = if report.outcome.is_failure() {
                    failed += 1;
                    "❌"
                } else {
                    "✅"
                };
                println!("{} {}: {}", icon, report.library, report.outcome);
            }
            if failed > 0 {
                bail!("{} of {} libraries failed to sync", failed, reports.len());
            }
        }
    }

    Ok(())
}
