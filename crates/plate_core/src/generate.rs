//! Autogeneration of values no layer supplied.

use uuid::Uuid;

use plate_spec::{RawValue, Variable, VariableType};

use crate::error::{CoreError, CoreResult};

/// Produces a value for an autogenerated variable.
#[cfg_attr(test, mockall::automock)]
pub trait ValueGenerator {
    fn generate(&self, variable: &Variable) -> CoreResult<RawValue>;
}

/// Random secrets derived from v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomValueGenerator;

impl RandomValueGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ValueGenerator for RandomValueGenerator {
    fn generate(&self, variable: &Variable) -> CoreResult<RawValue> {
        match variable.var_type {
            VariableType::String => Ok(RawValue::from(Uuid::new_v4().simple().to_string())),
            VariableType::Enum => variable
                .options
                .first()
                .map(|option| RawValue::from(option.as_str()))
                .ok_or_else(|| CoreError::Generation {
                    variable: variable.name.clone(),
                    message: "enum has no options".to_string(),
                }),
            other => Err(CoreError::Generation {
                variable: variable.name.clone(),
                message: format!("cannot generate values of type {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_distinct_secrets() {
        let generator = RandomValueGenerator::new();
        let var = Variable::new("database_password").sensitive().autogenerated();

        let a = generator.generate(&var).unwrap();
        let b = generator.generate(&var).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }

    #[test]
    fn test_enum_uses_first_option() {
        let var = Variable::new("tier").with_options(["small", "large"]);
        assert_eq!(
            RandomValueGenerator::new().generate(&var).unwrap(),
            RawValue::from("small")
        );
    }

    #[test]
    fn test_rejects_formatted_types() {
        let var = Variable::new("admin_email").with_type(VariableType::Email);
        let err = RandomValueGenerator::new().generate(&var).unwrap_err();
        assert!(matches!(err, CoreError::Generation { .. }));
    }
}
