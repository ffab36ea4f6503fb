//! Type coercion and semantic validation of resolved values.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::activation::Activation;
use crate::collection::Collection;
use crate::error::{SpecError, SpecResult, ValidationErrors, ValidationFailure, VariableValidationError};
use crate::precedence::ResolvedValues;
use crate::resolved::ResolvedVariableMap;
use crate::value::{RawValue, TypedValue, MASK};
use crate::variable::{Variable, VariableType};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static HOST_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap());

/// Parse the accepted boolean literals, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Hostname check: up to 253 characters of dot-separated labels.
pub fn is_valid_hostname(value: &str) -> bool {
    !value.is_empty() && value.len() <= 253 && value.split('.').all(|l| HOST_LABEL_RE.is_match(l))
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// URLs need an explicit `scheme://host`.
pub fn is_valid_url(value: &str) -> bool {
    value.contains("://")
        && Url::parse(value)
            .map(|url| url.has_host() && url.host_str().is_some_and(|h| !h.is_empty()))
            .unwrap_or(false)
}

/// Validates variables against their declared type and value policy.
pub struct Validator;

impl Validator {
    /// Coerce a non-empty raw value to the variable's type.
    pub fn coerce(var: &Variable, raw: &RawValue) -> Result<TypedValue, VariableValidationError> {
        let text = raw.to_string();
        let fail = |failure: ValidationFailure, message: String| VariableValidationError {
            variable: var.name.clone(),
            value: Some(if var.sensitive { MASK.to_string() } else { text.clone() }),
            failure,
            message,
        };

        match var.var_type {
            VariableType::String => Ok(TypedValue::String(text.clone())),
            VariableType::Integer => match raw {
                RawValue::Integer(n) => Ok(TypedValue::Integer(*n)),
                RawValue::Text(s) => s.trim().parse::<i64>().map(TypedValue::Integer).map_err(|_| {
                    fail(
                        ValidationFailure::InvalidType,
                        format!("'{}' is not an integer", var.display_value(&text)),
                    )
                }),
                _ => Err(fail(
                    ValidationFailure::InvalidType,
                    format!("'{}' is not an integer", var.display_value(&text)),
                )),
            },
            VariableType::Float => {
                let parsed = match raw {
                    RawValue::Float(x) => Some(*x),
                    RawValue::Integer(n) => Some(*n as f64),
                    RawValue::Text(s) if FLOAT_RE.is_match(s.trim()) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                // inf and nan are rejected whichever layer they come from
                parsed
                    .filter(|x| x.is_finite())
                    .map(TypedValue::Float)
                    .ok_or_else(|| {
                        fail(
                            ValidationFailure::InvalidType,
                            format!("'{}' is not a number", var.display_value(&text)),
                        )
                    })
            }
            VariableType::Boolean => {
                let parsed = match raw {
                    RawValue::Bool(b) => Some(*b),
                    RawValue::Integer(1) => Some(true),
                    RawValue::Integer(0) => Some(false),
                    RawValue::Text(s) => parse_bool(s),
                    _ => None,
                };
                parsed.map(TypedValue::Boolean).ok_or_else(|| {
                    fail(
                        ValidationFailure::InvalidType,
                        format!(
                            "'{}' is not a boolean (use true/false, yes/no or 1/0)",
                            var.display_value(&text)
                        ),
                    )
                })
            }
            VariableType::Email => {
                if is_valid_email(&text) {
                    Ok(TypedValue::String(text.clone()))
                } else {
                    Err(fail(
                        ValidationFailure::InvalidFormat,
                        format!("'{}' is not a valid email address", var.display_value(&text)),
                    ))
                }
            }
            VariableType::Url => {
                if is_valid_url(&text) {
                    Ok(TypedValue::String(text.clone()))
                } else {
                    Err(fail(
                        ValidationFailure::InvalidFormat,
                        format!(
                            "'{}' is not a valid URL (scheme://host required)",
                            var.display_value(&text)
                        ),
                    ))
                }
            }
            VariableType::Hostname => {
                if is_valid_hostname(&text) {
                    Ok(TypedValue::String(text.clone()))
                } else {
                    Err(fail(
                        ValidationFailure::InvalidFormat,
                        format!("'{}' is not a valid hostname", var.display_value(&text)),
                    ))
                }
            }
            VariableType::Enum => {
                if var.options.iter().any(|o| *o == text) {
                    Ok(TypedValue::String(text.clone()))
                } else {
                    Err(fail(
                        ValidationFailure::NotInOptions,
                        format!(
                            "'{}' is not one of: {}",
                            var.display_value(&text),
                            var.options.join(", ")
                        ),
                    ))
                }
            }
        }
    }

    /// Validate one variable's final raw value, applying the empty/absent
    /// policy before type coercion.
    pub fn validate(var: &Variable, raw: Option<&RawValue>) -> Result<TypedValue, VariableValidationError> {
        let missing = |failure: ValidationFailure, message: &str| VariableValidationError {
            variable: var.name.clone(),
            value: None,
            failure,
            message: message.to_string(),
        };

        match raw {
            None if var.optional => Ok(TypedValue::Absent),
            None => Err(missing(ValidationFailure::MissingValue, "no value provided")),
            Some(value) if value.is_empty() => {
                if var.required {
                    Err(missing(ValidationFailure::EmptyRequired, "required value is empty"))
                } else if var.var_type == VariableType::String {
                    Ok(TypedValue::String(String::new()))
                } else if var.optional {
                    Ok(TypedValue::Absent)
                } else {
                    Err(missing(
                        ValidationFailure::MissingValue,
                        &format!("empty value for {} variable", var.var_type),
                    ))
                }
            }
            Some(value) => Self::coerce(var, value),
        }
    }

    /// Validate every resolved variable, collecting all failures.
    ///
    /// Autogeneration must have run first; a variable still pending
    /// generation is treated as having no value.
    pub fn validate_all(
        collection: &Collection,
        activation: &Activation,
        resolved: &ResolvedValues,
    ) -> SpecResult<ResolvedVariableMap> {
        let mut errors = ValidationErrors::default();
        let mut map = ResolvedVariableMap::new(activation.active.clone());

        for (name, outcome) in resolved.iter() {
            let Some(var) = collection.variable(name) else {
                continue;
            };
            match Self::validate(var, outcome.value()) {
                Ok(value) => map.insert(var, value),
                Err(e) => {
                    debug!("Validation failed for {}: {}", name, e.message);
                    errors.errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(map)
        } else {
            Err(SpecError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(var: &Variable, raw: &str) -> Result<TypedValue, VariableValidationError> {
        Validator::validate(var, Some(&RawValue::text(raw)))
    }

    #[test]
    fn test_boolean_literals() {
        let var = Variable::new("flag").with_type(VariableType::Boolean);
        for (input, expected) in [("TRUE", true), ("yes", true), ("1", true), ("No", false), ("0", false)] {
            assert_eq!(check(&var, input).unwrap(), TypedValue::Boolean(expected), "{input}");
        }
        assert_eq!(check(&var, "on").unwrap_err().failure, ValidationFailure::InvalidType);
        assert_eq!(
            Validator::validate(&var, Some(&RawValue::Bool(false))).unwrap(),
            TypedValue::Boolean(false)
        );
    }

    #[test]
    fn test_integer_and_float() {
        let int = Variable::new("port").with_type(VariableType::Integer);
        assert_eq!(check(&int, "8080").unwrap(), TypedValue::Integer(8080));
        assert_eq!(check(&int, "-3").unwrap(), TypedValue::Integer(-3));
        assert!(check(&int, "80.5").is_err());
        assert!(check(&int, "eighty").is_err());

        let float = Variable::new("ratio").with_type(VariableType::Float);
        assert_eq!(check(&float, "0.25").unwrap(), TypedValue::Float(0.25));
        assert_eq!(check(&float, "1e3").unwrap(), TypedValue::Float(1000.0));
        assert_eq!(
            Validator::validate(&float, Some(&RawValue::Integer(2))).unwrap(),
            TypedValue::Float(2.0)
        );
        assert!(check(&float, "inf").is_err());
        assert!(check(&float, "NaN").is_err());
        assert!(check(&float, "1,5").is_err());
    }

    #[test]
    fn test_non_finite_yaml_floats_are_rejected() {
        let float = Variable::new("ratio").with_type(VariableType::Float);
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let err = Validator::validate(&float, Some(&RawValue::Float(value))).unwrap_err();
            assert_eq!(err.failure, ValidationFailure::InvalidType);
        }
        assert!(check(&float, "1e999").is_err());

        let parsed: RawValue = serde_yaml::from_str(".inf").unwrap();
        assert!(Validator::validate(&float, Some(&parsed)).is_err());
    }

    #[test]
    fn test_formats() {
        let email = Variable::new("email").with_type(VariableType::Email);
        assert!(check(&email, "ops@example.com").is_ok());
        assert_eq!(
            check(&email, "ops@localhost").unwrap_err().failure,
            ValidationFailure::InvalidFormat
        );

        let url = Variable::new("url").with_type(VariableType::Url);
        assert!(check(&url, "https://example.com/path").is_ok());
        assert!(check(&url, "example.com").is_err());
        assert!(check(&url, "localhost:8080").is_err());

        let host = Variable::new("host").with_type(VariableType::Hostname);
        assert!(check(&host, "localhost").is_ok());
        assert!(check(&host, "app-1.example.com").is_ok());
        assert!(check(&host, "-bad.example.com").is_err());
        assert!(check(&host, "under_score.com").is_err());
        assert!(check(&host, &"a".repeat(64)).is_err());
    }

    #[test]
    fn test_enum_membership_is_exact() {
        let var = Variable::new("mode").with_options(["a", "b", "c"]);
        assert!(check(&var, "b").is_ok());
        let err = check(&var, "d").unwrap_err();
        assert_eq!(err.variable, "mode");
        assert_eq!(err.value.as_deref(), Some("d"));
        assert_eq!(err.failure, ValidationFailure::NotInOptions);
        assert!(check(&var, "B").is_err());
    }

    #[test]
    fn test_missing_and_empty_policy() {
        let plain = Variable::new("name");
        assert_eq!(
            Validator::validate(&plain, None).unwrap_err().failure,
            ValidationFailure::MissingValue
        );
        assert_eq!(check(&plain, "").unwrap(), TypedValue::String(String::new()));

        let required = Variable::new("name").required();
        assert_eq!(
            check(&required, "").unwrap_err().failure,
            ValidationFailure::EmptyRequired
        );

        let optional = Variable::new("port").with_type(VariableType::Integer).optional();
        assert_eq!(Validator::validate(&optional, None).unwrap(), TypedValue::Absent);
        assert_eq!(check(&optional, "").unwrap(), TypedValue::Absent);

        let optional_text = Variable::new("notes").optional();
        assert_eq!(check(&optional_text, "").unwrap(), TypedValue::String(String::new()));
    }

    #[test]
    fn test_sensitive_values_are_masked_in_errors() {
        let var = Variable::new("pin").with_type(VariableType::Integer).sensitive();
        let err = check(&var, "12ab").unwrap_err();
        assert_eq!(err.value.as_deref(), Some(MASK));
        assert!(!err.message.contains("12ab"));
    }
}
