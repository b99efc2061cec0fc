//! # Parameters
//!
//! Typed inputs to a config. A parameter is one of three closed variants:
//!
//! - **Value**: a literal JSON value.
//! - **EnvironmentVariable**: looked up in the process environment at resolve time.
//! - **Reference**: the resolved property of another config.

use crate::coordinate::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known parameter holding a config's display name.
pub const NAME_PARAMETER: &str = "name";

/// Well-known parameter holding a settings scope.
pub const SCOPE_PARAMETER: &str = "scope";

/// Property every deployed entity exposes for its remote identifier.
pub const ID_PROPERTY: &str = "id";

/// Name prefix of parameters synthesized from literal id occurrences in templates.
pub const IMPLICIT_REFERENCE_PREFIX: &str = "__ref_";

/// Name prefix of parameters synthesized to force a deployment order.
pub const ORDERING_HINT_PREFIX: &str = "__ordering_hint_";

/// Parameters of a config, ordered by name.
pub type Parameters = BTreeMap<String, Parameter>;

/// Points at a property of another config's resolved entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceParameter {
    /// Config whose entity is referenced
    pub coordinate: Coordinate,
    /// Property of that entity (usually `id`)
    pub property: String,
}

impl ReferenceParameter {
    pub fn new(coordinate: Coordinate, property: impl Into<String>) -> Self {
        Self {
            coordinate,
            property: property.into(),
        }
    }

    /// Reference to the remote id of `coordinate`.
    pub fn to_id(coordinate: Coordinate) -> Self {
        Self::new(coordinate, ID_PROPERTY)
    }
}

/// A typed config input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parameter {
    /// Literal value
    Value { value: serde_json::Value },
    /// Process environment lookup with optional fallback
    EnvironmentVariable {
        name: String,
        default: Option<String>,
    },
    /// Property of another config's resolved entity
    Reference(ReferenceParameter),
}

impl Parameter {
    pub fn value(value: impl Into<serde_json::Value>) -> Self {
        Parameter::Value {
            value: value.into(),
        }
    }

    pub fn env(name: impl Into<String>) -> Self {
        Parameter::EnvironmentVariable {
            name: name.into(),
            default: None,
        }
    }

    pub fn env_with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Parameter::EnvironmentVariable {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn reference(coordinate: Coordinate, property: impl Into<String>) -> Self {
        Parameter::Reference(ReferenceParameter::new(coordinate, property))
    }

    /// The referenced parameter, if this is a reference.
    pub fn as_reference(&self) -> Option<&ReferenceParameter> {
        match self {
            Parameter::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// The literal value, if this is a value parameter.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Parameter::Value { value } => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_accessors() {
        let target = Coordinate::new("p", "t", "a");
        let param = Parameter::reference(target.clone(), "id");

        assert_eq!(param.as_reference().unwrap().coordinate, target);
        assert!(param.as_value().is_none());
    }

    #[test]
    fn test_serde_tagging() {
        let param = Parameter::env_with_default("TOKEN", "x");
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["kind"], "environment_variable");
        assert_eq!(json["default"], "x");

        let back: Parameter = serde_json::from_value(json).unwrap();
        assert_eq!(back, param);
    }
}
