//! Template identifiers: bare (`nginx`) or library-qualified (`nginx.my-library`).

use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;

/// A parsed template identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId {
    pub template: String,
    /// Set when the identifier is bound to one library.
    pub library: Option<String>,
}

impl TemplateId {
    pub fn bare(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            library: None,
        }
    }

    pub fn qualified(template: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            library: Some(library.into()),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.library.is_some()
    }
}

impl FromStr for TemplateId {
    type Err = TemplateError;

    /// Splits at the first `.`; both halves must be non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| TemplateError::InvalidIdentifier {
            identifier: s.to_string(),
            message: message.to_string(),
        };

        let s_trimmed = s.trim();
        if s_trimmed.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if s_trimmed.contains(['/', '\\']) {
            return Err(invalid("identifier must not contain path separators"));
        }

        match s_trimmed.split_once('.') {
            None => Ok(Self::bare(s_trimmed)),
            Some((template, library)) => {
                if template.is_empty() {
                    return Err(invalid("template name is empty"));
                }
                if library.is_empty() {
                    return Err(invalid("library name is empty"));
                }
                Ok(Self::qualified(template, library))
            }
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library {
            Some(library) => write!(f, "{}.{}", self.template, library),
            None => write!(f, "{}", self.template),
        }
    }
}
