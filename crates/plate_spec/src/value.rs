//! Raw and validated variable values.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Mask shown in place of sensitive values.
pub const MASK: &str = "********";

/// An untyped scalar as supplied by one precedence layer.
///
/// YAML sources keep their scalar kind; CLI overrides always arrive as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// True only for an empty text value. `false` and `0` are real values.
    pub fn is_empty(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Integer(n) => write!(f, "{}", n),
            // `{:?}` keeps the fractional part: 16.0 stays "16.0"
            RawValue::Float(x) => write!(f, "{:?}", x),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

/// A validated value of the variable's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// An optional variable that ended up without a value.
    Absent,
}

impl TypedValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, TypedValue::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Text used when substituting into a template body. `Absent` renders empty.
    pub fn render(&self) -> String {
        match self {
            TypedValue::String(s) => s.clone(),
            TypedValue::Integer(n) => n.to_string(),
            TypedValue::Float(x) => format!("{:?}", x),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Absent => String::new(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Absent => f.write_str("<unset>"),
            other => f.write_str(&other.render()),
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::String(s) => serializer.serialize_str(s),
            TypedValue::Integer(n) => serializer.serialize_i64(*n),
            TypedValue::Float(x) => serializer.serialize_f64(*x),
            TypedValue::Boolean(b) => serializer.serialize_bool(*b),
            TypedValue::Absent => serializer.serialize_none(),
        }
    }
}
