//! Template package manifest (`template.yaml`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use plate_spec::{OrderedMap, SchemaVersion, SectionPatch};

/// Descriptive metadata of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template version
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Last update date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Tags for searching
    #[serde(default)]
    pub tags: Vec<String>,
    /// Drafts resolve but are flagged as not ready
    #[serde(default)]
    pub draft: bool,
    /// Shown to the user after generation
    #[serde(default)]
    pub next_steps: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A parsed `template.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// Module this template belongs to (e.g. `compose`)
    pub kind: String,
    /// Declared schema version; templates without one use 1.0
    #[serde(default)]
    pub schema: Option<SchemaVersion>,
    pub metadata: TemplateMetadata,
    /// Section patches merged onto the module's collection
    #[serde(default)]
    pub spec: OrderedMap<SectionPatch>,
}

impl TemplateDocument {
    /// Parse a manifest. `template` names the package in error messages.
    pub fn parse(template: &str, source: &str) -> Result<Self, crate::TemplateError> {
        serde_yaml::from_str(source).map_err(|e| crate::TemplateError::InvalidManifest {
            template: template.to_string(),
            message: e.to_string(),
        })
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.schema.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let doc = TemplateDocument::parse(
            "nginx",
            r#"
kind: compose
schema: "1.1"
metadata:
  name: Nginx
  description: Web server
  version: 1.27.0
  author: Jane Doe
  date: 2025-01-15
  tags: [web, proxy]
  next_steps: Open http://localhost
spec:
  general:
    vars:
      service_name:
        default: nginx
  ports:
    vars:
      http_port:
        type: int
        default: 8080
"#,
        )
        .unwrap();

        assert_eq!(doc.kind, "compose");
        assert_eq!(doc.schema_version(), SchemaVersion::new(1, 1));
        assert_eq!(doc.metadata.date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(doc.spec.keys().collect::<Vec<_>>(), vec!["general", "ports"]);
        assert!(!doc.metadata.draft);
    }

    #[test]
    fn test_schema_defaults_to_one_zero() {
        let doc = TemplateDocument::parse(
            "minimal",
            "kind: compose\nmetadata:\n  name: Minimal\n",
        )
        .unwrap();
        assert_eq!(doc.schema_version(), SchemaVersion::V1_0);
        assert!(doc.spec.is_empty());
    }

    #[test]
    fn test_invalid_manifest_names_template() {
        let err = TemplateDocument::parse("broken", "kind: [").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
