//! Parameter Resolver
//!
//! Turns a config's typed parameters into concrete values against the
//! entities deployed so far, and renders its template with them.
//!
//! Also hosts the two passes that run over a whole environment before the
//! graph is built:
//! - [`validate_unique_identifiers`] rejects colliding configs
//! - [`insert_ordering_hints`] adds references the platform needs but users
//!   never declare

use crate::domain::entity_map::EntityMap;
use crate::domain::errors::DeploymentError;
use crate::ports::outbound::EnvironmentLookup;
use shared_types::{
    Config, Coordinate, Parameter, Properties, ReferenceParameter, ResourceType,
    NAME_PARAMETER, ORDERING_HINT_PREFIX, SCOPE_PARAMETER,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Settings schema whose objects switch a feature on for a scope.
pub const TOGGLE_SCHEMA: &str = "builtin:rum.web.enablement";

/// Settings schema whose objects are lists that need the toggle first.
pub const TOGGLE_DEPENDENT_SCHEMA: &str = "builtin:rum.web.key-user-actions";

/// Outcome of resolving one config
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every parameter has a value
    Properties(Properties),
    /// A referenced config was skipped, so this one is skipped too
    Skip { dependency: Coordinate },
}

/// Resolves parameters against an [`EntityMap`].
#[derive(Clone)]
pub struct ParameterResolver {
    environment: Arc<dyn EnvironmentLookup>,
}

impl ParameterResolver {
    pub fn new(environment: Arc<dyn EnvironmentLookup>) -> Self {
        Self { environment }
    }

    /// Resolve every parameter of `config`.
    ///
    /// A reference to a skipped entity wins over any other outcome. A
    /// reference to a config missing from `entities` means it has not been
    /// deployed yet, which the sort order rules out.
    pub fn resolve(
        &self,
        config: &Config,
        entities: &EntityMap,
    ) -> Result<Resolution, DeploymentError> {
        // Skips propagate before anything else is looked at
        let mut referenced = HashMap::new();
        for reference in config.parameters.values().filter_map(Parameter::as_reference) {
            let entity = entities.get_entity(&reference.coordinate).ok_or_else(|| {
                DeploymentError::UnresolvedDependency {
                    coordinate: config.coordinate.clone(),
                    dependency: reference.coordinate.clone(),
                }
            })?;
            if entity.skip {
                debug!(
                    coordinate = %config.coordinate,
                    dependency = %reference.coordinate,
                    "Dependency skipped, skipping config"
                );
                return Ok(Resolution::Skip {
                    dependency: reference.coordinate.clone(),
                });
            }
            referenced.insert(reference.coordinate.clone(), entity);
        }

        let mut properties = Properties::new();
        for (name, parameter) in &config.parameters {
            let value = match parameter {
                Parameter::Value { value } => value.clone(),
                Parameter::EnvironmentVariable { name: variable, default } => self
                    .environment
                    .var(variable)
                    .or_else(|| default.clone())
                    .map(serde_json::Value::String)
                    .ok_or_else(|| DeploymentError::MissingEnvVar {
                        coordinate: config.coordinate.clone(),
                        parameter: name.clone(),
                        variable: variable.clone(),
                    })?,
                Parameter::Reference(reference) => {
                    resolve_reference(config, reference, &referenced)?
                }
            };
            properties.insert(name.clone(), value);
        }

        Ok(Resolution::Properties(properties))
    }

    /// Render the template of `config` with resolved `properties`.
    pub fn render(&self, config: &Config, properties: &Properties) -> Result<String, DeploymentError> {
        config
            .template
            .render(properties)
            .map_err(|e| DeploymentError::Validation {
                coordinate: config.coordinate.clone(),
                message: e.to_string(),
            })
    }
}

fn resolve_reference(
    config: &Config,
    reference: &ReferenceParameter,
    referenced: &HashMap<Coordinate, shared_types::ResolvedEntity>,
) -> Result<serde_json::Value, DeploymentError> {
    let unresolved = || DeploymentError::UnresolvedProperty {
        coordinate: config.coordinate.clone(),
        dependency: reference.coordinate.clone(),
        property: reference.property.clone(),
    };
    let entity = referenced.get(&reference.coordinate).ok_or_else(unresolved)?;

    if let Some(value) = entity.properties.get(&reference.property) {
        return Ok(value.clone());
    }
    // Adapters report the display name separately from the properties
    if reference.property == NAME_PARAMETER && !entity.entity_name.is_empty() {
        return Ok(serde_json::Value::String(entity.entity_name.clone()));
    }
    Err(unresolved())
}

/// Make every key-user-actions list reference the RUM toggles of its scope.
///
/// The platform rejects a list whose toggle does not exist yet. The hint is
/// an ordinary Reference parameter, so the sorter needs no special case.
/// Returns the number of hints inserted.
pub fn insert_ordering_hints(configs: &mut [Config]) -> usize {
    let toggles: Vec<(Coordinate, Option<Parameter>)> = configs
        .iter()
        .filter(|c| is_settings_schema(&c.resource_type, TOGGLE_SCHEMA))
        .map(|c| (c.coordinate.clone(), c.parameters.get(SCOPE_PARAMETER).cloned()))
        .collect();

    if toggles.is_empty() {
        return 0;
    }

    let mut inserted = 0;
    for config in configs
        .iter_mut()
        .filter(|c| is_settings_schema(&c.resource_type, TOGGLE_DEPENDENT_SCHEMA))
    {
        let scope = config.parameters.get(SCOPE_PARAMETER).cloned();
        for (toggle, toggle_scope) in &toggles {
            if !toggle.same_project(&config.coordinate) || *toggle_scope != scope {
                continue;
            }
            let name = format!("{}{}", ORDERING_HINT_PREFIX, toggle.config_id);
            if config.parameters.contains_key(&name) {
                continue;
            }
            config.parameters.insert(name, Parameter::reference(toggle.clone(), "id"));
            inserted += 1;
            debug!(coordinate = %config.coordinate, toggle = %toggle, "Inserted ordering hint");
        }
    }

    inserted
}

fn is_settings_schema(resource_type: &ResourceType, schema: &str) -> bool {
    matches!(resource_type, ResourceType::Settings { schema_id } if schema_id == schema)
}

/// Reject configs that would collide on the remote platform.
///
/// Checked before anything is deployed:
/// - the same coordinate twice
/// - the same literal name twice within a type that identifies objects by name
/// - the same origin object id twice within a type
///
/// Skipped configs never collide. Every collision is returned.
pub fn validate_unique_identifiers(configs: &[Config]) -> Vec<DeploymentError> {
    let mut errors = Vec::new();
    let mut coordinates: HashMap<&Coordinate, &Coordinate> = HashMap::new();
    let mut names: HashMap<(&str, &str), &Coordinate> = HashMap::new();
    let mut origins: HashMap<(&str, &str), &Coordinate> = HashMap::new();

    let mut collide = |first: &Coordinate, second: &Coordinate, identifier: String| {
        errors.push(DeploymentError::DuplicateIdentifier {
            first: first.clone(),
            second: second.clone(),
            identifier,
        });
    };

    for config in configs.iter().filter(|c| !c.skip) {
        let coordinate = &config.coordinate;

        if let Some(first) = coordinates.insert(coordinate, coordinate) {
            collide(first, coordinate, "the same coordinate".to_string());
            continue;
        }

        if config.resource_type.has_unique_names() {
            if let Some(name) = config.literal_name() {
                let key = (coordinate.config_type.as_str(), name);
                match names.get(&key) {
                    Some(first) => collide(first, coordinate, format!("name '{name}'")),
                    None => {
                        names.insert(key, coordinate);
                    }
                }
            }
        }

        if let Some(origin) = config.origin_object_id.as_deref() {
            let key = (coordinate.config_type.as_str(), origin);
            match origins.get(&key) {
                Some(first) => collide(first, coordinate, format!("origin object id '{origin}'")),
                None => {
                    origins.insert(key, coordinate);
                }
            }
        }
    }

    errors
}
