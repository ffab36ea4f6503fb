//! Interactive prompts for variable values.
//!
//! Sections are walked in collection order. A toggled section asks its toggle
//! first and skips its variables when the answer is no; sections whose
//! `needs` are not active are skipped entirely.

use std::collections::{HashMap, HashSet};
use std::io;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};

use plate_core::{CoreError, CoreResult, Prompter};
use plate_spec::{
    parse_bool, Activation, ActivationEngine, Collection, RawValue, Validator, Variable,
    VariableType,
};

/// Asks through the terminal with `dialoguer`.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Ask for one variable. `None` keeps whatever the lower layers supply.
    fn ask(&self, var: &Variable, current: Option<&RawValue>) -> CoreResult<Option<RawValue>> {
        // prompt_text() falls back to the description, so only show it alongside a custom prompt
        if var.prompt.is_some() && !var.description.is_empty() {
            eprintln!("  {}", var.description);
        }
        let prompt = var.prompt_text();

        match var.var_type {
            VariableType::Boolean => {
                let default = current
                    .and_then(|v| parse_bool(&v.to_string()))
                    .unwrap_or(false);
                let answer = Confirm::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .default(default)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(Some(RawValue::Bool(answer)))
            }
            VariableType::Enum => {
                let default_idx = current
                    .and_then(|v| var.options.iter().position(|o| *o == v.to_string()))
                    .unwrap_or(0);
                let idx = Select::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .items(&var.options)
                    .default(default_idx)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(var.options.get(idx).map(|o| RawValue::text(o.as_str())))
            }
            _ if var.sensitive => {
                let hint = match (current.is_some(), var.autogenerated) {
                    (true, _) => " (leave empty to keep the current value)",
                    (false, true) => " (leave empty to generate)",
                    (false, false) => "",
                };
                let answer = Password::with_theme(&self.theme)
                    .with_prompt(format!("{}{}", prompt, hint))
                    .allow_empty_password(true)
                    .interact()
                    .map_err(prompt_error)?;
                Ok((!answer.is_empty()).then(|| RawValue::text(answer)))
            }
            _ => {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .allow_empty(true);
                if let Some(value) = current {
                    input = input.default(value.to_string());
                }
                let validated = var.clone();
                let answer = input
                    .validate_with(move |text: &String| -> Result<(), String> {
                        if text.is_empty() {
                            return Ok(());
                        }
                        Validator::coerce(&validated, &RawValue::text(text.as_str()))
                            .map(|_| ())
                            .map_err(|e| e.message)
                    })
                    .interact_text()
                    .map_err(prompt_error)?;
                Ok((!answer.is_empty()).then(|| RawValue::text(answer)))
            }
        }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn prompt(
        &mut self,
        collection: &Collection,
        activation: &Activation,
        known: &HashMap<String, RawValue>,
    ) -> CoreResult<HashMap<String, RawValue>> {
        let mut answers: HashMap<String, RawValue> = HashMap::new();
        let mut activation = activation.clone();
        let current = |name: &str, answers: &HashMap<String, RawValue>| {
            answers.get(name).or_else(|| known.get(name)).cloned()
        };

        let toggles = section_toggles(collection);

        for section in collection.sections() {
            if !section.needs.iter().all(|n| activation.is_active(n)) {
                continue;
            }

            if let (Some(toggle), false) = (&section.toggle, section.required) {
                let default = current(toggle, &answers)
                    .and_then(|v| parse_bool(&v.to_string()))
                    .unwrap_or(false);
                let enabled = Confirm::with_theme(&self.theme)
                    .with_prompt(format!("Enable {}?", section.title))
                    .default(default)
                    .interact()
                    .map_err(prompt_error)?;
                answers.insert(toggle.clone(), RawValue::Bool(enabled));

                let mut merged = known.clone();
                merged.extend(answers.iter().map(|(k, v)| (k.clone(), v.clone())));
                activation = ActivationEngine::activate(collection, &merged)?;
                if !enabled {
                    continue;
                }
            }

            eprintln!();
            eprintln!("── {} ──", section.title);
            for var in &section.vars {
                if toggles.contains(var.name.as_str()) {
                    continue;
                }
                let value = current(&var.name, &answers);
                if let Some(answer) = self.ask(var, value.as_ref())? {
                    answers.insert(var.name.clone(), answer);
                }
            }
        }

        Ok(answers)
    }
}

/// Toggle variables of optional sections. They are asked as "Enable X?" on the
/// section they gate, never as plain variables where they are defined.
fn section_toggles(collection: &Collection) -> HashSet<&str> {
    collection
        .sections()
        .iter()
        .filter(|s| !s.required)
        .filter_map(|s| s.toggle.as_deref())
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> CoreError {
    match e {
        dialoguer::Error::IO(io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
            CoreError::Prompt("input cancelled by user".to_string())
        }
        dialoguer::Error::IO(io_err) => CoreError::Prompt(io_err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plate_spec::{SchemaVersion, Section};

    #[test]
    fn test_toggle_in_required_section_is_only_a_section_question() {
        let collection = Collection::new(SchemaVersion::V1_0)
            .with_section(
                Section::new("general")
                    .required()
                    .with_var(Variable::new("service_name"))
                    .with_var(Variable::new("traefik_enabled").with_type(VariableType::Boolean)),
            )
            .with_section(
                Section::new("traefik")
                    .with_toggle("traefik_enabled")
                    .with_var(Variable::new("traefik_host")),
            );

        let toggles = section_toggles(&collection);
        assert!(toggles.contains("traefik_enabled"));
        assert!(!toggles.contains("service_name"));
        assert_eq!(toggles.len(), 1);
    }
}
