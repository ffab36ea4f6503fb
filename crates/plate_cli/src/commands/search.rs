//! Search command - Find templates by keyword.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::list::print_entries;
use super::{GlobalOptions, Session};

#[derive(Args)]
pub struct SearchArgs {
    /// Module to search
    module: String,

    /// Case-insensitive text matched against id, name, description and tags
    query: String,
}

pub fn execute(args: SearchArgs, options: &GlobalOptions) -> Result<()> {
    let session = Session::open(options)?;
    session.check_module(&args.module)?;

    info!("Searching {} templates for '{}'", args.module, args.query);
    let entries = session.resolver.search(&args.module, &args.query)?;

    println!("🔍 {} match(es) for '{}' in {}", entries.len(), args.query, args.module);
    print_entries(&entries);
    Ok(())
}
