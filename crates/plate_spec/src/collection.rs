//! Collections: the full, ordered variable specification of a module or template.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::{SpecError, SpecResult};
use crate::ordered::OrderedMap;
use crate::schema::SchemaVersion;
use crate::section::{Section, SectionPatch};
use crate::validator::Validator;
use crate::value::RawValue;
use crate::variable::{Variable, VariableType};

/// Sections in declaration order plus the schema version they were built for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub schema_version: SchemaVersion,
    sections: Vec<Section>,
}

impl Collection {
    pub fn new(schema_version: SchemaVersion) -> Self {
        Self {
            schema_version,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub(crate) fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Every variable with its owning section, in display order.
    pub fn variables(&self) -> impl Iterator<Item = (&Section, &Variable)> {
        self.sections
            .iter()
            .flat_map(|s| s.vars.iter().map(move |v| (s, v)))
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables().find(|(_, v)| v.name == name).map(|(_, v)| v)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.vars.iter_mut())
            .find(|v| v.name == name)
    }

    /// The section a variable is defined in.
    pub fn section_of(&self, variable: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.has_variable(variable))
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables().map(|(_, v)| v.name.as_str()).collect()
    }

    /// Declared defaults, keyed by variable name.
    pub fn defaults(&self) -> HashMap<String, RawValue> {
        self.variables()
            .filter_map(|(_, v)| v.default.clone().map(|d| (v.name.clone(), d)))
            .collect()
    }

    /// Merge a template's `spec` block onto this collection.
    ///
    /// Unknown sections and variables are added, known ones have the given
    /// attributes overridden. Nothing is ever removed.
    pub fn merge(&mut self, spec: &OrderedMap<SectionPatch>) -> SpecResult<()> {
        for (section_name, patch) in spec.iter() {
            if !self.has_section(section_name) {
                debug!("Adding section '{}' from template", section_name);
                for var_name in patch.vars.keys() {
                    self.ensure_unique_variable(section_name, var_name)?;
                }
                self.sections.push(Section::from_patch(section_name, patch));
                continue;
            }

            for var_name in patch.vars.keys() {
                if let Some(owner) = self.section_of(var_name) {
                    if owner.name != section_name {
                        return Err(SpecError::definition(
                            format!("spec.{}.vars.{}", section_name, var_name),
                            format!("variable is already defined in section '{}'", owner.name),
                        ));
                    }
                }
            }

            let Some(section) = self.section_mut(section_name) else {
                continue;
            };
            section.apply_attributes(patch);
            for (var_name, var_patch) in patch.vars.iter() {
                match section.variable_mut(var_name) {
                    Some(var) => var.apply(var_patch),
                    None => section.vars.push(Variable::from_patch(var_name, var_patch)),
                }
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_unique_variable(&self, section: &str, variable: &str) -> SpecResult<()> {
        match self.section_of(variable) {
            Some(owner) => Err(SpecError::definition(
                format!("spec.{}.vars.{}", section, variable),
                format!("variable is already defined in section '{}'", owner.name),
            )),
            None => Ok(()),
        }
    }

    /// Check the authoring invariants of the collection.
    pub fn validate_structure(&self) -> SpecResult<()> {
        let mut seen_vars = HashSet::new();
        let mut seen_sections = HashSet::new();

        for section in &self.sections {
            if !seen_sections.insert(section.name.as_str()) {
                return Err(SpecError::definition(
                    format!("spec.{}", section.name),
                    "duplicate section",
                ));
            }
            for var in &section.vars {
                if !seen_vars.insert(var.name.as_str()) {
                    return Err(SpecError::definition(
                        format!("spec.{}.vars.{}", section.name, var.name),
                        "variable names must be unique across sections",
                    ));
                }
                check_variable(section, var)?;
            }
        }

        for section in &self.sections {
            self.check_needs(section)?;
            self.check_toggle(section)?;
        }

        self.check_cycles()
    }

    fn check_needs(&self, section: &Section) -> SpecResult<()> {
        for need in &section.needs {
            if *need == section.name {
                return Err(SpecError::CircularSectionDependency {
                    cycle: vec![section.name.clone(), section.name.clone()],
                });
            }
            if !self.has_section(need) {
                return Err(SpecError::definition(
                    format!("spec.{}.needs", section.name),
                    format!("unknown section '{}'", need),
                ));
            }
        }
        Ok(())
    }

    fn check_toggle(&self, section: &Section) -> SpecResult<()> {
        let Some(toggle) = &section.toggle else {
            return Ok(());
        };
        let location = format!("spec.{}.toggle", section.name);

        let Some(owner) = self.section_of(toggle) else {
            return Err(SpecError::definition(
                location,
                format!("unknown variable '{}'", toggle),
            ));
        };
        if owner.name != section.name && !owner.required {
            return Err(SpecError::definition(
                location,
                format!(
                    "toggle '{}' must live in this section or in a required section, not in conditional section '{}'",
                    toggle, owner.name
                ),
            ));
        }
        if let Some(var) = owner.variable(toggle) {
            if var.var_type != VariableType::Boolean {
                return Err(SpecError::definition(
                    location,
                    format!("toggle '{}' must be a boolean, found {}", toggle, var.var_type),
                ));
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> SpecResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            collection: &'a Collection,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> SpecResult<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|n| *n == name).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(SpecError::CircularSectionDependency { cycle });
                }
                None => {}
            }

            marks.insert(name, Mark::Visiting);
            path.push(name);
            if let Some(section) = collection.section(name) {
                for need in &section.needs {
                    visit(collection, need, marks, path)?;
                }
            }
            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for section in &self.sections {
            visit(self, &section.name, &mut marks, &mut Vec::new())?;
        }
        Ok(())
    }
}

fn check_variable(section: &Section, var: &Variable) -> SpecResult<()> {
    let location = format!("spec.{}.vars.{}", section.name, var.name);

    if var.required && var.optional {
        return Err(SpecError::definition(
            location,
            "a variable cannot be both required and optional",
        ));
    }

    let is_enum = var.var_type == VariableType::Enum;
    if is_enum && var.options.is_empty() {
        return Err(SpecError::definition(location, "enum variables need options"));
    }
    if !is_enum && !var.options.is_empty() {
        return Err(SpecError::definition(
            location,
            format!("options are only allowed on enum variables, not {}", var.var_type),
        ));
    }

    if let Some(default) = &var.default {
        if !default.is_empty() {
            if let Err(e) = Validator::coerce(var, default) {
                return Err(SpecError::definition(
                    location,
                    format!("default does not match the declared type: {}", e.message),
                ));
            }
        }
    }
    Ok(())
}
