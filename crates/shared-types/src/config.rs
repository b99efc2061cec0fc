//! # Configs
//!
//! A `Config` is one loaded configuration unit. The loader produces one
//! immutable snapshot per environment, already expanded with environment and
//! group overrides.
//!
//! ## Resource types
//!
//! - **ClassicApi**: legacy REST configuration APIs (dashboards, alerting...)
//! - **Settings**: schema-based settings objects
//! - **Automation**: workflows, business calendars, scheduling rules
//! - **Bucket**: storage buckets
//! - **Document**: dashboards and notebooks on the document service
//! - **Segment**: filter segments

use crate::coordinate::Coordinate;
use crate::parameter::{Parameter, Parameters, NAME_PARAMETER};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classic APIs whose content is a dashboard.
const DASHBOARD_APIS: &[&str] = &["dashboard", "dashboard-v2"];

/// Classic APIs that allow several objects with the same name.
const NON_UNIQUE_NAME_APIS: &[&str] = &[
    "dashboard",
    "dashboard-v2",
    "alerting-profile",
    "notification",
    "slo",
];

/// Automation resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationResource {
    Workflow,
    BusinessCalendar,
    SchedulingRule,
}

/// Document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Dashboard,
    Notebook,
}

/// Resource kind of a config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceType {
    ClassicApi { api: String },
    Settings { schema_id: String },
    Automation { resource: AutomationResource },
    Bucket,
    Document { document: DocumentKind },
    Segment,
}

/// Tag used to look up the deploy adapter for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    ClassicApi,
    Settings,
    Automation,
    Bucket,
    Document,
    Segment,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 6] = [
        AdapterKind::ClassicApi,
        AdapterKind::Settings,
        AdapterKind::Automation,
        AdapterKind::Bucket,
        AdapterKind::Document,
        AdapterKind::Segment,
    ];
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::ClassicApi => "classic-api",
            AdapterKind::Settings => "settings",
            AdapterKind::Automation => "automation",
            AdapterKind::Bucket => "bucket",
            AdapterKind::Document => "document",
            AdapterKind::Segment => "segment",
        };
        f.write_str(name)
    }
}

impl ResourceType {
    /// Adapter tag for this resource type.
    pub fn adapter_kind(&self) -> AdapterKind {
        match self {
            ResourceType::ClassicApi { .. } => AdapterKind::ClassicApi,
            ResourceType::Settings { .. } => AdapterKind::Settings,
            ResourceType::Automation { .. } => AdapterKind::Automation,
            ResourceType::Bucket => AdapterKind::Bucket,
            ResourceType::Document { .. } => AdapterKind::Document,
            ResourceType::Segment => AdapterKind::Segment,
        }
    }

    /// Type identifier as used in coordinates and for name-uniqueness scoping.
    pub fn type_id(&self) -> String {
        match self {
            ResourceType::ClassicApi { api } => api.clone(),
            ResourceType::Settings { schema_id } => schema_id.clone(),
            ResourceType::Automation { resource } => match resource {
                AutomationResource::Workflow => "workflow".to_string(),
                AutomationResource::BusinessCalendar => "business-calendar".to_string(),
                AutomationResource::SchedulingRule => "scheduling-rule".to_string(),
            },
            ResourceType::Bucket => "bucket".to_string(),
            ResourceType::Document { document } => match document {
                DocumentKind::Dashboard => "document-dashboard".to_string(),
                DocumentKind::Notebook => "document-notebook".to_string(),
            },
            ResourceType::Segment => "segment".to_string(),
        }
    }

    /// Dashboards embed links and markdown that routinely contain other
    /// configs' ids, so implicit references between them are ignored.
    pub fn is_dashboard_like(&self) -> bool {
        match self {
            ResourceType::ClassicApi { api } => DASHBOARD_APIS.contains(&api.as_str()),
            ResourceType::Document { document } => *document == DocumentKind::Dashboard,
            _ => false,
        }
    }

    /// Whether the remote platform identifies objects of this type by name.
    pub fn has_unique_names(&self) -> bool {
        match self {
            ResourceType::ClassicApi { api } => !NON_UNIQUE_NAME_APIS.contains(&api.as_str()),
            _ => false,
        }
    }
}

/// A loaded configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Unique key
    pub coordinate: Coordinate,
    /// Resource kind
    pub resource_type: ResourceType,
    /// Renderable body
    pub template: Template,
    /// Typed inputs by name
    pub parameters: Parameters,
    /// Skip deployment; dependents resolve to skip as well
    pub skip: bool,
    /// Environment group the config was expanded for
    pub group: String,
    /// Environment the config deploys to
    pub environment: String,
    /// Identifier of the remote object this config was downloaded from
    pub origin_object_id: Option<String>,
}

impl Config {
    pub fn new(
        coordinate: Coordinate,
        resource_type: ResourceType,
        template: Template,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            coordinate,
            resource_type,
            template,
            parameters: Parameters::new(),
            skip: false,
            group: "default".to_string(),
            environment: environment.into(),
            origin_object_id: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_origin_object_id(mut self, id: impl Into<String>) -> Self {
        self.origin_object_id = Some(id.into());
        self
    }

    /// Coordinates this config references through its parameters.
    pub fn references(&self) -> impl Iterator<Item = &Coordinate> {
        self.parameters
            .values()
            .filter_map(|p| p.as_reference())
            .map(|r| &r.coordinate)
    }

    /// Literal `name` parameter, if the name is not computed.
    pub fn literal_name(&self) -> Option<&str> {
        self.parameters
            .get(NAME_PARAMETER)
            .and_then(|p| p.as_value())
            .and_then(|v| v.as_str())
    }
}
