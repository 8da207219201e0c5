//! Deployment parameters declared by adapters and supplied at start time.
//!
//! An adapter declares the parameters its operator accepts; callers of
//! the start operation supply matching [`ParameterInstance`] values. The
//! supplied list is validated against the declaration before anything is
//! sent to the remote gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The type of a deployment parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Free-form text.
    Text,
    /// Numeric value.
    Number,
    /// Boolean toggle.
    Switch,
}

impl ParameterType {
    /// All parameter types, in declaration order. Backs the static
    /// parameter-type listing of the API surface.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Text, Self::Number, Self::Switch]
    }

    /// String form of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Switch => "switch",
        }
    }
}

/// A parameter declared by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, unique within the adapter.
    pub name: String,

    /// Expected value type.
    #[serde(rename = "type")]
    pub kind: ParameterType,

    /// Optional unit hint (display only).
    #[serde(default)]
    pub unit: Option<String>,

    /// Whether the parameter must be supplied on start.
    #[serde(default)]
    pub mandatory: bool,
}

/// A typed parameter value supplied at start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    /// Free-form text.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean toggle.
    Switch(bool),
}

impl ParameterValue {
    /// The type this value satisfies.
    #[must_use]
    pub const fn kind(&self) -> ParameterType {
        match self {
            Self::Text(_) => ParameterType::Text,
            Self::Number(_) => ParameterType::Number,
            Self::Switch(_) => ParameterType::Switch,
        }
    }
}

/// A named parameter value, paired against a declared [`Parameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInstance {
    /// Name of the declared parameter this value is for.
    pub name: String,

    /// The supplied value.
    pub value: ParameterValue,
}

impl ParameterInstance {
    /// Create a named parameter value.
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parameter validation failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParameterError {
    /// A mandatory declared parameter was not supplied.
    #[error("mandatory parameter not supplied: {name}")]
    MissingMandatory {
        /// The missing parameter name.
        name: String,
    },

    /// A supplied value does not match the declared type.
    #[error("parameter {name} expects {expected} but got {provided}")]
    TypeMismatch {
        /// The parameter name.
        name: String,
        /// Declared type.
        expected: &'static str,
        /// Supplied type.
        provided: &'static str,
    },

    /// A supplied parameter is not declared by the adapter.
    #[error("unknown parameter: {name}")]
    UnknownParameter {
        /// The undeclared parameter name.
        name: String,
    },
}

/// Validate supplied parameter values against an adapter's declarations.
///
/// Every mandatory declared parameter must be present, every supplied
/// value must be declared, and value types must match declared types.
///
/// # Errors
///
/// Returns the first violation found as a [`ParameterError`].
pub fn validate(declared: &[Parameter], supplied: &[ParameterInstance]) -> Result<(), ParameterError> {
    for parameter in declared {
        let instance = supplied.iter().find(|i| i.name == parameter.name);
        match instance {
            Some(instance) => {
                if instance.value.kind() != parameter.kind {
                    return Err(ParameterError::TypeMismatch {
                        name: parameter.name.clone(),
                        expected: parameter.kind.as_str(),
                        provided: instance.value.kind().as_str(),
                    });
                }
            },
            None if parameter.mandatory => {
                return Err(ParameterError::MissingMandatory {
                    name: parameter.name.clone(),
                });
            },
            None => {},
        }
    }

    if let Some(unknown) = supplied
        .iter()
        .find(|i| !declared.iter().any(|p| p.name == i.name))
    {
        return Err(ParameterError::UnknownParameter {
            name: unknown.name.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared() -> Vec<Parameter> {
        vec![
            Parameter {
                name: "interval".to_string(),
                kind: ParameterType::Number,
                unit: Some("seconds".to_string()),
                mandatory: true,
            },
            Parameter {
                name: "topic".to_string(),
                kind: ParameterType::Text,
                unit: None,
                mandatory: false,
            },
        ]
    }

    #[test]
    fn accepts_matching_parameters() {
        let supplied = vec![
            ParameterInstance::new("interval", ParameterValue::Number(30.0)),
            ParameterInstance::new("topic", ParameterValue::Text("sensors/temp".to_string())),
        ];
        assert!(validate(&declared(), &supplied).is_ok());
    }

    #[test]
    fn optional_parameters_may_be_omitted() {
        let supplied = vec![ParameterInstance::new("interval", ParameterValue::Number(5.0))];
        assert!(validate(&declared(), &supplied).is_ok());
    }

    #[test]
    fn missing_mandatory_parameter_is_rejected() {
        let err = validate(&declared(), &[]).unwrap_err();
        assert!(matches!(err, ParameterError::MissingMandatory { name } if name == "interval"));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let supplied = vec![ParameterInstance::new(
            "interval",
            ParameterValue::Text("thirty".to_string()),
        )];
        let err = validate(&declared(), &supplied).unwrap_err();
        assert!(matches!(
            err,
            ParameterError::TypeMismatch { expected: "number", provided: "text", .. }
        ));
    }

    #[test]
    fn undeclared_parameter_is_rejected() {
        let supplied = vec![
            ParameterInstance::new("interval", ParameterValue::Number(30.0)),
            ParameterInstance::new("debug", ParameterValue::Switch(true)),
        ];
        let err = validate(&declared(), &supplied).unwrap_err();
        assert!(matches!(err, ParameterError::UnknownParameter { name } if name == "debug"));
    }

    #[test]
    fn all_types_are_listed() {
        assert_eq!(
            ParameterType::all(),
            &[ParameterType::Text, ParameterType::Number, ParameterType::Switch]
        );
    }
}
