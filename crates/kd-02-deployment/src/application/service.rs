//! Deployment Service
//!
//! Runs the whole pipeline for one environment:
//!
//! 1. Uniqueness pre-flight; a collision aborts the environment
//! 2. Ordering hints
//! 3. Graph build, split and sort
//! 4. Builder errors fail their config; dropped duplicates get an event
//! 5. Cyclic components are reported, the rest is deployed
//! 6. Report and summary

use crate::adapters::environment::ProcessEnvironment;
use crate::adapters::registry::AdapterRegistry;
use crate::adapters::reporter::TracingReporter;
use crate::application::orchestrator::{CancellationSignal, Orchestrator};
use crate::application::resolver::{insert_ordering_hints, validate_unique_identifiers, ParameterResolver};
use crate::config::DeploymentConfig;
use crate::domain::entity_map::EntityMap;
use crate::domain::errors::DeploymentError;
use crate::domain::report::{DeploymentEvent, DeploymentReport, DeploymentSummary};
use crate::ports::inbound::DeploymentApi;
use crate::ports::outbound::{EnvironmentLookup, Reporter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keel_telemetry::DeploymentMetrics;
use kd_01_dependency_graph::{DependencyGraphApi, DependencyGraphService, GraphConfig, GraphError};
use shared_types::{Config, Coordinate, ResolvedEntity};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Deployment service
///
/// Owns everything a run needs; nothing is process-global.
pub struct DeploymentService {
    adapters: AdapterRegistry,
    graph: DependencyGraphService,
    config: DeploymentConfig,
    environment: Arc<dyn EnvironmentLookup>,
    reporter: Arc<dyn Reporter>,
    metrics: Option<DeploymentMetrics>,
}

impl DeploymentService {
    /// Service deploying through `adapters` with default configuration.
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            adapters,
            graph: DependencyGraphService::new(),
            config: DeploymentConfig::default(),
            environment: Arc::new(ProcessEnvironment),
            reporter: Arc::new(TracingReporter),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: DeploymentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_graph_config(mut self, config: GraphConfig) -> Self {
        self.graph = DependencyGraphService::with_config(config);
        self
    }

    /// Source of environment variable parameters.
    pub fn with_environment(mut self, environment: Arc<dyn EnvironmentLookup>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_metrics(mut self, metrics: DeploymentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    fn orchestrator(&self) -> Orchestrator {
        let adapters = if self.config.dry_run {
            AdapterRegistry::dry_run()
        } else {
            self.adapters.clone()
        };
        let adapters = adapters.with_retries(self.config.retry, self.metrics.clone());

        let orchestrator = Orchestrator::new(
            adapters,
            ParameterResolver::new(Arc::clone(&self.environment)),
            self.config.clone(),
        )
        .with_reporter(Arc::clone(&self.reporter));

        match &self.metrics {
            Some(metrics) => orchestrator.with_metrics(metrics.clone()),
            None => orchestrator,
        }
    }

    fn emit(&self, event: DeploymentEvent) -> DeploymentEvent {
        if let Some(metrics) = &self.metrics {
            metrics.record_config(event.state.as_str());
        }
        self.reporter.report(&event);
        event
    }

    /// Report every config as excluded and return the fatal `errors`.
    fn abort(
        &self,
        environment: &str,
        coordinates: &[Coordinate],
        errors: Vec<DeploymentError>,
        reason: &str,
        started_at: DateTime<Utc>,
    ) -> DeploymentReport {
        error!(environment, errors = errors.len(), reason, "Aborting environment");
        let events = coordinates
            .iter()
            .map(|c| self.emit(DeploymentEvent::excluded(c.clone(), reason)))
            .collect();
        self.report(environment, events, Vec::new(), errors, started_at)
    }

    fn report(
        &self,
        environment: &str,
        events: Vec<DeploymentEvent>,
        results: Vec<ResolvedEntity>,
        errors: Vec<DeploymentError>,
        started_at: DateTime<Utc>,
    ) -> DeploymentReport {
        let summary = DeploymentSummary::from_events(&events, started_at);
        self.reporter.finish(environment, &summary);
        DeploymentReport {
            environment: environment.to_string(),
            events,
            summary,
            results,
            errors,
        }
    }
}

#[async_trait]
impl DeploymentApi for DeploymentService {
    async fn deploy_environment(
        &self,
        environment: &str,
        mut configs: Vec<Config>,
        cancel: &CancellationSignal,
    ) -> DeploymentReport {
        let started_at = Utc::now();
        info!(
            environment,
            configs = configs.len(),
            dry_run = self.config.dry_run,
            "Starting deployment"
        );

        let coordinates: Vec<Coordinate> = configs.iter().map(|c| c.coordinate.clone()).collect();

        // 1. Colliding identifiers are fatal to the whole environment
        let duplicates = validate_unique_identifiers(&configs);
        if !duplicates.is_empty() {
            for duplicate in &duplicates {
                error!(environment, error = %duplicate, "Duplicate identifier");
            }
            return self.abort(
                environment,
                &coordinates,
                duplicates,
                "duplicate identifiers in environment",
                started_at,
            );
        }

        // 2. Ordering hints
        let hints = insert_ordering_hints(&mut configs);
        if hints > 0 {
            info!(environment, hints, "Inserted ordering hints");
        }

        // 3. Plan
        let plan = match self.graph.plan(configs) {
            Ok(plan) => plan,
            Err(e) => {
                return self.abort(
                    environment,
                    &coordinates,
                    vec![e.into()],
                    "dependency graph rejected",
                    started_at,
                )
            }
        };

        // 4. Builder errors are local to one config
        let mut events = Vec::new();
        let mut errors = Vec::new();
        let mut invalid: HashMap<Coordinate, DeploymentError> = HashMap::new();
        for graph_error in plan.errors {
            let error = DeploymentError::from(graph_error);
            let Some(coordinate) = error.coordinate().cloned() else {
                errors.push(error);
                continue;
            };
            if matches!(error, DeploymentError::Graph(GraphError::DuplicateCoordinate { .. })) {
                // The later config never made it into the graph
                events.push(self.emit(DeploymentEvent::error(coordinate, &error)));
                errors.push(error);
            } else {
                invalid.entry(coordinate).or_insert(error);
            }
        }

        // 5. Cycles fail their own component only
        for rejected in plan.rejected {
            let cycle = match rejected.error {
                GraphError::CyclicDependency { coordinates } => coordinates,
                other => {
                    warn!(component_id = rejected.id, error = %other, "Unexpected sort failure");
                    rejected.coordinates.clone()
                }
            };
            let error = DeploymentError::CyclicDependency {
                component_id: rejected.id,
                coordinates: cycle,
            };
            for coordinate in &rejected.coordinates {
                let event = DeploymentEvent::error(coordinate.clone(), &error).in_component(rejected.id);
                events.push(self.emit(event));
                errors.extend(invalid.remove(coordinate));
            }
            errors.push(error);
        }

        // 6. Deploy, with an entity map private to this environment
        let outcome = self
            .orchestrator()
            .deploy_with_invalid(
                environment,
                plan.components,
                invalid,
                Arc::new(EntityMap::new()),
                cancel,
            )
            .await;
        events.extend(outcome.events);
        errors.extend(outcome.errors);

        let report = self.report(environment, events, outcome.results, errors, started_at);
        info!(
            environment,
            success = report.summary.success,
            errors = report.errors.len(),
            "Environment deployed"
        );
        report
    }

    async fn deploy_environments(
        &self,
        environments: BTreeMap<String, Vec<Config>>,
        cancel: &CancellationSignal,
    ) -> Vec<DeploymentReport> {
        let mut reports = Vec::with_capacity(environments.len());
        for (environment, configs) in environments {
            reports.push(self.deploy_environment(&environment, configs, cancel).await);
        }
        reports
    }
}
