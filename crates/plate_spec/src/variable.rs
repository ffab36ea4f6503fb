//! Variable definitions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::value::{RawValue, MASK};

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    #[default]
    #[serde(alias = "str")]
    String,
    #[serde(alias = "int")]
    Integer,
    Float,
    #[serde(alias = "bool")]
    Boolean,
    Email,
    Url,
    Hostname,
    Enum,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Integer => "integer",
            VariableType::Float => "float",
            VariableType::Boolean => "boolean",
            VariableType::Email => "email",
            VariableType::Url => "url",
            VariableType::Hostname => "hostname",
            VariableType::Enum => "enum",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable attributes as written in YAML. Every attribute is optional so the
/// same shape serves as a full definition and as an override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariablePatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<VariableType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autogenerated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(
        default,
        deserialize_with = "scalar_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl VariablePatch {
    /// Names of the attributes this patch sets.
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut attrs = Vec::new();
        if self.var_type.is_some() {
            attrs.push("type");
        }
        if self.default.is_some() {
            attrs.push("default");
        }
        if self.description.is_some() {
            attrs.push("description");
        }
        if self.prompt.is_some() {
            attrs.push("prompt");
        }
        if self.sensitive.is_some() {
            attrs.push("sensitive");
        }
        if self.autogenerated.is_some() {
            attrs.push("autogenerated");
        }
        if self.required.is_some() {
            attrs.push("required");
        }
        if self.optional.is_some() {
            attrs.push("optional");
        }
        if self.options.is_some() {
            attrs.push("options");
        }
        if self.extra.is_some() {
            attrs.push("extra");
        }
        attrs
    }
}

/// Accept `options: [a, 1, true]` by stringifying each scalar.
fn scalar_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    let values: Option<Vec<RawValue>> = Option::deserialize(deserializer)?;
    Ok(values.map(|v| v.iter().map(ToString::to_string).collect()))
}

/// A fully-defined variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub default: Option<RawValue>,
    pub description: String,
    pub prompt: Option<String>,
    pub sensitive: bool,
    pub autogenerated: bool,
    pub required: bool,
    pub optional: bool,
    pub options: Vec<String>,
    pub extra: Option<String>,
}

impl Variable {
    /// A plain string variable with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: VariableType::String,
            default: None,
            description: String::new(),
            prompt: None,
            sensitive: false,
            autogenerated: false,
            required: false,
            optional: false,
            options: Vec::new(),
            extra: None,
        }
    }

    pub fn from_patch(name: impl Into<String>, patch: &VariablePatch) -> Self {
        let mut var = Self::new(name);
        var.apply(patch);
        var
    }

    /// Overwrite every attribute the patch sets.
    pub fn apply(&mut self, patch: &VariablePatch) {
        if let Some(t) = patch.var_type {
            self.var_type = t;
        }
        if let Some(d) = &patch.default {
            self.default = Some(d.clone());
        }
        if let Some(d) = &patch.description {
            self.description = d.clone();
        }
        if let Some(p) = &patch.prompt {
            self.prompt = Some(p.clone());
        }
        if let Some(s) = patch.sensitive {
            self.sensitive = s;
        }
        if let Some(a) = patch.autogenerated {
            self.autogenerated = a;
        }
        if let Some(r) = patch.required {
            self.required = r;
        }
        if let Some(o) = patch.optional {
            self.optional = o;
        }
        if let Some(o) = &patch.options {
            self.options = o.clone();
        }
        if let Some(e) = &patch.extra {
            self.extra = Some(e.clone());
        }
    }

    pub fn with_type(mut self, var_type: VariableType) -> Self {
        self.var_type = var_type;
        self
    }

    pub fn with_default(mut self, value: impl Into<RawValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.var_type = VariableType::Enum;
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn autogenerated(mut self) -> Self {
        self.autogenerated = true;
        self
    }

    /// Prompt text, falling back to the description and then the name.
    pub fn prompt_text(&self) -> &str {
        match &self.prompt {
            Some(p) => p,
            None if !self.description.is_empty() => &self.description,
            None => &self.name,
        }
    }

    /// Render a value for display, masking sensitive variables.
    pub fn display_value(&self, value: &impl fmt::Display) -> String {
        if self.sensitive {
            MASK.to_string()
        } else {
            value.to_string()
        }
    }
}
