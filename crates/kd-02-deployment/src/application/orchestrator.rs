//! Deployment Orchestrator
//!
//! Deploys sorted components with a bounded pool of workers.
//!
//! ```text
//!            ┌──────────── queue of components ────────────┐
//!            │  c0   c1   c2   c3   ...                    │
//!            └──┬─────────┬──────────┬─────────────────────┘
//!          worker 0   worker 1   worker N-1        (N = concurrency)
//!               │
//!               ▼  configs of one component, strictly in sorted order
//!        resolve ──► render ──► adapter.deploy ──► EntityMap::put
//! ```
//!
//! A failing config fails every config that depends on it inside its
//! component. Independent branches and other components keep going.

use crate::adapters::registry::AdapterRegistry;
use crate::adapters::reporter::TracingReporter;
use crate::application::resolver::{ParameterResolver, Resolution};
use crate::config::DeploymentConfig;
use crate::domain::entity_map::EntityMap;
use crate::domain::errors::DeploymentError;
use crate::domain::report::DeploymentEvent;
use crate::ports::outbound::{DeployContext, Reporter};
use futures::future::join_all;
use futures::FutureExt;
use keel_telemetry::DeploymentMetrics;
use kd_01_dependency_graph::SortedComponent;
use parking_lot::Mutex;
use shared_types::{Config, Coordinate, ResolvedEntity};
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, Instrument};

/// Cooperative cancellation shared between the caller and the workers.
///
/// Once cancelled, no new config is started. Calls already in flight run to
/// completion or until their timeout.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        if !self.tx.send_replace(true) {
            info!("Deployment cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            // The sender lives as long as `self`
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything produced by one orchestrator run, in component id order
#[derive(Debug, Default)]
pub struct DeploymentOutcome {
    pub events: Vec<DeploymentEvent>,
    pub results: Vec<ResolvedEntity>,
    pub errors: Vec<DeploymentError>,
}

impl DeploymentOutcome {
    fn merge(&mut self, other: DeploymentOutcome) {
        self.events.extend(other.events);
        self.results.extend(other.results);
        self.errors.extend(other.errors);
    }
}

/// What happened to a config that was handed to its adapter
enum ConfigOutcome {
    Deployed(ResolvedEntity),
    /// A referenced config was skipped
    Skipped { dependency: Coordinate },
}

/// Deploys sorted components concurrently.
#[derive(Clone)]
pub struct Orchestrator {
    adapters: AdapterRegistry,
    resolver: ParameterResolver,
    config: DeploymentConfig,
    reporter: Arc<dyn Reporter>,
    metrics: Option<DeploymentMetrics>,
}

impl Orchestrator {
    pub fn new(adapters: AdapterRegistry, resolver: ParameterResolver, config: DeploymentConfig) -> Self {
        Self {
            adapters,
            resolver,
            config,
            reporter: Arc::new(TracingReporter),
            metrics: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_metrics(mut self, metrics: DeploymentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Deploy `components` of `environment`, recording entities in
    /// `entities`.
    ///
    /// Never aborts on a failing config; every config ends up with exactly
    /// one event.
    pub async fn deploy(
        &self,
        environment: &str,
        components: Vec<SortedComponent>,
        entities: Arc<EntityMap>,
        cancel: &CancellationSignal,
    ) -> DeploymentOutcome {
        self.deploy_with_invalid(environment, components, HashMap::new(), entities, cancel)
            .await
    }

    /// Like [`deploy`](Self::deploy), but configs in `invalid` fail with
    /// their error instead of being deployed. Their dependents are skipped.
    pub async fn deploy_with_invalid(
        &self,
        environment: &str,
        components: Vec<SortedComponent>,
        invalid: HashMap<Coordinate, DeploymentError>,
        entities: Arc<EntityMap>,
        cancel: &CancellationSignal,
    ) -> DeploymentOutcome {
        let workers = self.config.worker_count().min(components.len());
        info!(
            environment,
            components = components.len(),
            workers,
            "Deploying components"
        );

        let state = Arc::new(WorkerState {
            orchestrator: self.clone(),
            environment: environment.to_string(),
            entities,
            cancel: cancel.clone(),
            invalid,
            queue: Mutex::new(components.into_iter().collect()),
            failed: AtomicBool::new(false),
            outcomes: Mutex::new(Vec::new()),
        });

        let handles = (0..workers).map(|worker| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.run(worker).await })
        });

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "Deployment worker terminated abnormally");
            }
        }

        let mut outcomes = std::mem::take(&mut *state.outcomes.lock());
        outcomes.sort_by_key(|(id, _)| *id);

        outcomes
            .into_iter()
            .fold(DeploymentOutcome::default(), |mut all, (_, outcome)| {
                all.merge(outcome);
                all
            })
    }

    /// Resolve, render and deploy one config.
    async fn deploy_config(
        &self,
        ctx: &DeployContext,
        config: &Config,
        entities: &EntityMap,
    ) -> Result<ConfigOutcome, DeploymentError> {
        let coordinate = &config.coordinate;

        let properties = match self.resolver.resolve(config, entities)? {
            Resolution::Properties(properties) => properties,
            Resolution::Skip { dependency } => return Ok(ConfigOutcome::Skipped { dependency }),
        };
        let rendered = self.resolver.render(config, &properties)?;

        let kind = config.resource_type.adapter_kind();
        let adapter = self
            .adapters
            .get(kind)
            .ok_or_else(|| DeploymentError::MissingAdapter {
                coordinate: coordinate.clone(),
                kind,
            })?;

        let result = {
            let _timer = self.metrics.as_ref().map(DeploymentMetrics::start_timer);
            AssertUnwindSafe(adapter.deploy(ctx, &properties, &rendered, config))
                .catch_unwind()
                .await
        };
        let result = result.map_err(|panic| {
            let message = panic_message(panic.as_ref());
            error!(coordinate = %coordinate, panic = %message, "Deploy adapter panicked");
            DeploymentError::AdapterPanicked {
                coordinate: coordinate.clone(),
                message,
            }
        })?;
        let mut entity = result.map_err(|source| DeploymentError::Api {
            coordinate: coordinate.clone(),
            source,
        })?;

        // Adapters may not know the coordinate they deployed for
        entity.coordinate = coordinate.clone();
        entity.skip = false;

        if !config.resource_type.has_unique_names()
            && !entity.entity_name.is_empty()
            && entity.id().is_none()
            && entities.contains(&coordinate.config_type, &entity.entity_name)
        {
            return Err(DeploymentError::Validation {
                coordinate: coordinate.clone(),
                message: format!(
                    "name '{}' is already deployed and the adapter returned no id to tell them apart",
                    entity.entity_name
                ),
            });
        }

        Ok(ConfigOutcome::Deployed(entity))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Shared by all workers of one run
struct WorkerState {
    orchestrator: Orchestrator,
    environment: String,
    entities: Arc<EntityMap>,
    cancel: CancellationSignal,
    /// Configs rejected before deployment started
    invalid: HashMap<Coordinate, DeploymentError>,
    queue: Mutex<VecDeque<SortedComponent>>,
    /// Set on the first error anywhere, for fail-fast
    failed: AtomicBool,
    outcomes: Mutex<Vec<(usize, DeploymentOutcome)>>,
}

impl WorkerState {
    async fn run(&self, worker: usize) {
        loop {
            let next = self.queue.lock().pop_front();
            let Some(component) = next else {
                break;
            };

            let span = keel_telemetry::deploy_span!(
                "deploy_component",
                component_id = component.id,
                environment = %self.environment
            );
            let outcome = self.deploy_component(&component).instrument(span).await;
            self.outcomes.lock().push((component.id, outcome));
        }
        debug!(worker, "Worker idle, queue empty");
    }

    async fn deploy_component(&self, component: &SortedComponent) -> DeploymentOutcome {
        let orchestrator = &self.orchestrator;
        let ctx = DeployContext {
            environment: self.environment.clone(),
            component_id: component.id,
            call_timeout: orchestrator.config.call_timeout(),
        };
        let mut outcome = DeploymentOutcome::default();
        // Configs that errored, directly or through a dependency
        let mut failed: HashSet<Coordinate> = HashSet::new();

        debug!(configs = component.len(), "Deploying component");

        for config in &component.configs {
            let coordinate = &config.coordinate;

            let failed_dependency = component
                .dependencies_of(coordinate)
                .iter()
                .find(|d| failed.contains(*d));

            let event = if self.cancel.is_cancelled() {
                let error = DeploymentError::Cancelled {
                    coordinate: coordinate.clone(),
                };
                DeploymentEvent::excluded(coordinate.clone(), "cancelled").with_error(&error)
            } else if orchestrator.config.fail_fast && self.failed.load(Ordering::SeqCst) {
                DeploymentEvent::excluded(coordinate.clone(), "not started after an earlier failure")
            } else if let Some(dependency) = failed_dependency {
                let error = DeploymentError::FailedDependency {
                    coordinate: coordinate.clone(),
                    dependency: dependency.clone(),
                };
                failed.insert(coordinate.clone());
                DeploymentEvent::skipped(coordinate.clone(), format!("dependency {dependency} failed"))
                    .with_error(&error)
            } else if config.skip {
                self.record_skip(&mut outcome, coordinate);
                DeploymentEvent::skipped(coordinate.clone(), "skip flag set")
            } else if let Some(error) = self.invalid.get(coordinate) {
                failed.insert(coordinate.clone());
                self.failed.store(true, Ordering::SeqCst);
                outcome.errors.push(error.clone());
                DeploymentEvent::error(coordinate.clone(), error)
            } else {
                match orchestrator.deploy_config(&ctx, config, &self.entities).await {
                    Ok(ConfigOutcome::Deployed(entity)) => {
                        self.entities.put(entity.clone());
                        outcome.results.push(entity);
                        DeploymentEvent::success(coordinate.clone())
                    }
                    Ok(ConfigOutcome::Skipped { dependency }) => {
                        self.record_skip(&mut outcome, coordinate);
                        DeploymentEvent::skipped(
                            coordinate.clone(),
                            format!("dependency {dependency} was skipped"),
                        )
                    }
                    Err(e) => {
                        if e.is_fatal_bug() {
                            error!(error = %e, "Config referenced before it was deployed, sort order violated");
                        }
                        failed.insert(coordinate.clone());
                        self.failed.store(true, Ordering::SeqCst);
                        let event = DeploymentEvent::error(coordinate.clone(), &e);
                        outcome.errors.push(e);
                        event
                    }
                }
            };

            let event = event.in_component(component.id);
            if let Some(metrics) = &orchestrator.metrics {
                metrics.record_config(event.state.as_str());
            }
            orchestrator.reporter.report(&event);
            outcome.events.push(event);
        }

        outcome
    }

    /// Record a skipped entity so dependents skip as well.
    fn record_skip(&self, outcome: &mut DeploymentOutcome, coordinate: &Coordinate) {
        let entity = ResolvedEntity::skipped(coordinate.clone());
        self.entities.put(entity.clone());
        outcome.results.push(entity);
    }
}
