//! Sections: named, possibly conditional groups of variables.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ordered::OrderedMap;
use crate::variable::{Variable, VariablePatch};

/// Section attributes as written in YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub needs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: OrderedMap<VariablePatch>,
}

impl SectionPatch {
    /// Names of the section-level attributes this patch sets (variables excluded).
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut attrs = Vec::new();
        if self.title.is_some() {
            attrs.push("title");
        }
        if self.description.is_some() {
            attrs.push("description");
        }
        if self.required.is_some() {
            attrs.push("required");
        }
        if self.toggle.is_some() {
            attrs.push("toggle");
        }
        if self.needs.is_some() {
            attrs.push("needs");
        }
        attrs
    }
}

/// `needs: other` and `needs: [a, b]` are both accepted.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}

/// A resolved section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    /// Always active, regardless of toggle and needs.
    pub required: bool,
    /// Boolean variable gating the section.
    pub toggle: Option<String>,
    /// Sections that must be active before this one can activate.
    pub needs: Vec<String>,
    pub vars: Vec<Variable>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: None,
            required: false,
            toggle: None,
            needs: Vec::new(),
            vars: Vec::new(),
        }
    }

    /// Build a section and its variables from a patch.
    pub fn from_patch(name: impl Into<String>, patch: &SectionPatch) -> Self {
        let mut section = Self::new(name);
        section.apply_attributes(patch);
        for (var_name, var_patch) in patch.vars.iter() {
            section.vars.push(Variable::from_patch(var_name, var_patch));
        }
        section
    }

    /// Overwrite the section-level attributes the patch sets. Variables are
    /// merged separately by the collection.
    pub fn apply_attributes(&mut self, patch: &SectionPatch) {
        if let Some(t) = &patch.title {
            self.title = t.clone();
        }
        if let Some(d) = &patch.description {
            self.description = Some(d.clone());
        }
        if let Some(r) = patch.required {
            self.required = r;
        }
        if let Some(t) = &patch.toggle {
            self.toggle = Some(t.clone());
        }
        if let Some(n) = &patch.needs {
            self.needs = n.clone();
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_toggle(mut self, variable: impl Into<String>) -> Self {
        self.toggle = Some(variable.into());
        self
    }

    pub fn with_needs<I, S>(mut self, needs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs = needs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_var(mut self, var: Variable) -> Self {
        self.vars.push(var);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.iter_mut().find(|v| v.name == name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_from_yaml_patch() {
        let patch: SectionPatch = serde_yaml::from_str(
            r#"
title: Traefik
toggle: traefik_enabled
needs: network
vars:
  traefik_enabled:
    type: bool
    default: false
  traefik_host:
    type: hostname
"#,
        )
        .unwrap();

        let section = Section::from_patch("traefik", &patch);
        assert_eq!(section.title, "Traefik");
        assert_eq!(section.toggle.as_deref(), Some("traefik_enabled"));
        assert_eq!(section.needs, vec!["network"]);
        assert_eq!(
            section.vars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            vec!["traefik_enabled", "traefik_host"]
        );
        assert!(!section.required);
    }

    #[test]
    fn test_title_defaults_to_name() {
        let section = Section::from_patch("general", &SectionPatch::default());
        assert_eq!(section.title, "general");
    }
}
