//! The validated output handed to the rendering collaborator.

use std::collections::{BTreeMap, HashSet};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::value::{TypedValue, MASK};
use crate::variable::Variable;

/// Final, typed values of every active variable plus the active section set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedVariableMap {
    #[serde(serialize_with = "as_map")]
    values: Vec<(String, TypedValue)>,
    active_sections: Vec<String>,
    #[serde(skip)]
    sensitive: HashSet<String>,
}

impl ResolvedVariableMap {
    pub fn new(active_sections: Vec<String>) -> Self {
        Self {
            values: Vec::new(),
            active_sections,
            sensitive: HashSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, var: &Variable, value: TypedValue) {
        if var.sensitive {
            self.sensitive.insert(var.name.clone());
        }
        self.values.push((var.name.clone(), value));
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Values in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn active_sections(&self) -> &[String] {
        &self.active_sections
    }

    pub fn is_section_active(&self, section: &str) -> bool {
        self.active_sections.iter().any(|s| s == section)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive.contains(name)
    }

    /// Value for display: sensitive values are masked.
    pub fn display(&self, name: &str) -> Option<String> {
        let value = self.get(name)?;
        if self.is_sensitive(name) && !value.is_absent() {
            Some(MASK.to_string())
        } else {
            Some(value.to_string())
        }
    }

    /// Name → rendered text, as template engines expect.
    pub fn to_context(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(n, v)| (n.clone(), v.render()))
            .collect()
    }
}

fn as_map<S: Serializer>(values: &[(String, TypedValue)], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(values.len()))?;
    for (name, value) in values {
        map.serialize_entry(name, value)?;
    }
    map.end()
}
