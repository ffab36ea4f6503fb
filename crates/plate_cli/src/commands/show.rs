//! Show command - Describe a module's or template's variables.

use anyhow::Result;
use clap::Args;

use plate_core::Pipeline;
use plate_spec::{Collection, Section, Variable};

use super::{GlobalOptions, Session};

#[derive(Args)]
pub struct ShowArgs {
    /// Module name
    module: String,

    /// Template identifier (`id` or `id.library`); shows the module when omitted
    template: Option<String>,
}

pub fn execute(args: ShowArgs, options: &GlobalOptions) -> Result<()> {
    let session = Session::open(options)?;
    session.check_module(&args.module)?;
    let module = session.registry.get_required(&args.module)?;

    let collection = match &args.template {
        None => {
            println!("📦 Module: {}", module.name());
            println!("   {}", module.description());
            println!("   Schema: {}", module.schema_version());
            Pipeline::module_collection(module.as_ref())?
        }
        Some(identifier) => {
            let loaded = session.resolver.load(&args.module, identifier)?;
            let metadata = &loaded.document.metadata;

            println!("📄 Template: {} ({})", metadata.name, loaded.template.id);
            if !metadata.description.is_empty() {
                println!("   {}", metadata.description);
            }
            println!("   Library: {}", loaded.template.library);
            println!("   Version: {}", metadata.version);
            println!("   Schema:  {}", loaded.document.schema_version());
            if let Some(author) = &metadata.author {
                println!("   Author:  {}", author);
            }
            if let Some(date) = metadata.date {
                println!("   Updated: {}", date);
            }
            if !metadata.tags.is_empty() {
                println!("   Tags:    {}", metadata.tags.join(", "));
            }
            if metadata.draft {
                println!("   ⚠️  Draft template");
            }
            Pipeline::template_collection(module.as_ref(), &loaded.document)?
        }
    };

    println!();
    print_collection(&collection);
    Ok(())
}

fn print_collection(collection: &Collection) {
    for section in collection.sections() {
        println!("{}", section_heading(section));
        if let Some(description) = &section.description {
            println!("   {}", description);
        }
        for var in &section.vars {
            println!("   {}", variable_line(var));
        }
        println!();
    }
}

fn section_heading(section: &Section) -> String {
    let mut flags = Vec::new();
    if section.required {
        flags.push("required".to_string());
    }
    if let Some(toggle) = &section.toggle {
        flags.push(format!("toggle: {}", toggle));
    }
    if !section.needs.is_empty() {
        flags.push(format!("needs: {}", section.needs.join(", ")));
    }

    if flags.is_empty() {
        format!("▸ {} ({})", section.title, section.name)
    } else {
        format!("▸ {} ({}) [{}]", section.title, section.name, flags.join("; "))
    }
}

fn variable_line(var: &Variable) -> String {
    let mut line = format!("{:<28} {:<9}", var.name, var.var_type.as_str());
    if let Some(default) = &var.default {
        line.push_str(&format!(" = {}", var.display_value(default)));
    }

    let mut flags = Vec::new();
    if var.required {
        flags.push("required");
    }
    if var.optional {
        flags.push("optional");
    }
    if var.sensitive {
        flags.push("sensitive");
    }
    if var.autogenerated {
        flags.push("autogenerated");
    }
    if !flags.is_empty() {
        line.push_str(&format!(" ({})", flags.join(", ")));
    }
    if !var.options.is_empty() {
        line.push_str(&format!(" [{}]", var.options.join("|")));
    }
    if !var.description.is_empty() {
        line.push_str(&format!("  {}", var.description));
    }
    line
}
