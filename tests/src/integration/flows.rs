//! # Integration Test Flows
//!
//! End-to-end runs of the deployment pipeline with a stub adapter:
//!
//! 1. **Plan**: dependency graph → components → topological order
//! 2. **Deploy**: resolution against the entity map, adapter calls, retries
//! 3. **Report**: one event per config, root-cause errors, summary
//!
//! Failure isolation is checked at every level: config, dependents,
//! component.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{coord, referencing, zone, StubDeployApi};
    use keel_telemetry::DeploymentMetrics;
    use kd_01_dependency_graph::{DependencyGraphApi, DependencyGraphService, GraphError};
    use kd_02_deployment::{
        AdapterRegistry, ApiError, CancellationSignal, DeployApi, DeploymentApi, DeploymentConfig,
        DeploymentError, DeploymentReport, DeploymentService, DeploymentState, EntityMap,
        MemoryReporter, RetrySetting, RetrySettings, StaticEnvironment,
    };
    use serde_json::json;
    use shared_types::{AdapterKind, Config, Parameter, ResolvedEntity, ResourceType, Template};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn service(api: Arc<StubDeployApi>) -> DeploymentService {
        let adapters = AdapterRegistry::new().with_adapter(AdapterKind::ClassicApi, api as Arc<dyn DeployApi>);
        DeploymentService::new(adapters).with_environment(Arc::new(StaticEnvironment::new()))
    }

    async fn deploy(service: &DeploymentService, configs: Vec<Config>) -> DeploymentReport {
        service
            .deploy_environment("prod", configs, &CancellationSignal::new())
            .await
    }

    fn state(report: &DeploymentReport, id: &str) -> DeploymentState {
        report
            .event(&coord(id))
            .map(|e| e.state)
            .unwrap_or_else(|| panic!("no event for {id}"))
    }

    // =============================================================================
    // PLANNING
    // =============================================================================

    /// A ← B ← C sorts to [A, B, C] whatever order they were loaded in.
    #[test]
    fn test_chain_sorted_by_references() {
        let configs = vec![referencing(zone("c"), "b"), referencing(zone("b"), "a"), zone("a")];

        let plan = DependencyGraphService::new().plan(configs).unwrap();

        assert_eq!(plan.components.len(), 1);
        let order: Vec<_> = plan.components[0]
            .configs
            .iter()
            .map(|c| c.coordinate.config_id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    /// Nodes downstream of a cycle are not named as cycle members.
    #[test]
    fn test_cycle_names_members_only() {
        let configs = vec![
            referencing(zone("a"), "b"),
            referencing(zone("b"), "a"),
            referencing(zone("c"), "b"),
            zone("d"),
        ];

        let plan = DependencyGraphService::new().plan(configs).unwrap();

        assert_eq!(plan.components.len(), 1);
        assert_eq!(plan.rejected.len(), 1);
        match &plan.rejected[0].error {
            GraphError::CyclicDependency { coordinates } => {
                assert_eq!(coordinates, &vec![coord("a"), coord("b")]);
            }
            other => panic!("Expected cyclic dependency, got {other:?}"),
        }
    }

    // =============================================================================
    // DEPLOYMENT SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_chain_deploys_with_resolved_ids() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());

        let report = deploy(
            &service,
            vec![referencing(zone("c"), "b"), referencing(zone("b"), "a"), zone("a")],
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.summary.success, 3);
        assert_eq!(api.calls(), vec![coord("a"), coord("b"), coord("c")]);

        let b_props = api.properties_of(&coord("b")).unwrap();
        assert_eq!(b_props["a_id"], json!("remote-a"));
        let c_props = api.properties_of(&coord("c")).unwrap();
        assert_eq!(c_props["b_id"], json!("remote-b"));
    }

    /// B fails permanently: C is skipped without a call, the unrelated D ← E
    /// component still deploys.
    #[tokio::test]
    async fn test_permanent_failure_is_contained() {
        let api = Arc::new(StubDeployApi::new());
        api.fail(coord("b"), ApiError::from_status(400, "constraint violation"));
        let service = service(api.clone());

        let report = deploy(
            &service,
            vec![
                zone("a"),
                referencing(zone("b"), "a"),
                referencing(zone("c"), "b"),
                zone("d"),
                referencing(zone("e"), "d"),
            ],
        )
        .await;

        assert!(!report.is_success());
        assert_eq!(state(&report, "a"), DeploymentState::Success);
        assert_eq!(state(&report, "b"), DeploymentState::Error);
        assert_eq!(state(&report, "c"), DeploymentState::Skipped);
        assert_eq!(state(&report, "d"), DeploymentState::Success);
        assert_eq!(state(&report, "e"), DeploymentState::Success);
        assert!(!api.calls().contains(&coord("c")));

        // Permanent errors are not retried
        assert_eq!(api.calls().iter().filter(|c| **c == coord("b")).count(), 1);
        assert_eq!(report.errors.len(), 1);
    }

    /// Two transient failures then success, MaxRetries = 5: two fixed waits.
    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retried_with_fixed_wait() {
        let api = Arc::new(StubDeployApi::new());
        api.fail(coord("a"), ApiError::from_status(503, "unavailable"));
        api.fail(coord("a"), ApiError::from_status(502, "bad gateway"));
        let metrics = DeploymentMetrics::new().unwrap();
        let service = service(api.clone())
            .with_config(DeploymentConfig {
                retry: RetrySettings::uniform(RetrySetting::new(1_000, 5)),
                ..Default::default()
            })
            .with_metrics(metrics.clone());

        let start = tokio::time::Instant::now();
        let report = deploy(&service, vec![zone("a")]).await;

        assert!(report.is_success());
        assert_eq!(api.calls().len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(metrics.retries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_reports_attempts() {
        let api = Arc::new(StubDeployApi::new());
        for _ in 0..3 {
            api.fail(coord("a"), ApiError::from_status(429, "too many requests"));
        }
        let service = service(api.clone()).with_config(DeploymentConfig {
            retry: RetrySettings::uniform(RetrySetting::new(500, 2)),
            ..Default::default()
        });

        let report = deploy(&service, vec![zone("a")]).await;

        match &report.errors[0] {
            DeploymentError::Api {
                source: ApiError::RetriesExhausted { attempts, .. },
                ..
            } => assert_eq!(*attempts, 3),
            other => panic!("Expected exhausted retries, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_cycle_fails_its_component_only() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());

        let report = deploy(
            &service,
            vec![referencing(zone("a"), "b"), referencing(zone("b"), "a"), zone("d")],
        )
        .await;

        assert_eq!(state(&report, "a"), DeploymentState::Error);
        assert_eq!(state(&report, "b"), DeploymentState::Error);
        assert_eq!(state(&report, "d"), DeploymentState::Success);
        assert_eq!(api.calls(), vec![coord("d")]);
    }

    #[tokio::test]
    async fn test_skip_propagates_without_adapter_calls() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());

        let report = deploy(
            &service,
            vec![
                zone("a").with_skip(true),
                referencing(zone("b"), "a"),
                referencing(zone("c"), "b"),
            ],
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.summary.skipped, 3);
        assert!(api.calls().is_empty());
        assert!(report.results.iter().all(|r| r.skip));
    }

    /// A template mentioning another config's template id deploys after it
    /// and receives its id.
    #[tokio::test]
    async fn test_implicit_reference_resolved() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());
        let alerting = Config::new(
            coord("alerting"),
            ResourceType::ClassicApi {
                api: "management-zone".into(),
            },
            Template::new(
                "alerting.json",
                r#"{"name": "{{ .name }}", "zone": "a.json"}"#,
            ),
            "prod",
        )
        .with_parameter("name", Parameter::value(json!("alerting")));

        let report = deploy(&service, vec![alerting, zone("a")]).await;

        assert!(report.is_success());
        assert_eq!(api.calls(), vec![coord("a"), coord("alerting")]);
        let props = api.properties_of(&coord("alerting")).unwrap();
        assert!(props.values().any(|v| *v == json!("remote-a")));
    }

    #[tokio::test]
    async fn test_missing_environment_variable() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone()).with_environment(Arc::new(
            StaticEnvironment::new().with_var("OWNER", "platform-team"),
        ));

        let report = deploy(
            &service,
            vec![
                zone("a").with_parameter("owner", Parameter::env("OWNER")),
                zone("b").with_parameter("token", Parameter::env("TOKEN")),
                referencing(zone("c"), "b"),
            ],
        )
        .await;

        assert_eq!(state(&report, "a"), DeploymentState::Success);
        assert_eq!(state(&report, "b"), DeploymentState::Error);
        assert_eq!(state(&report, "c"), DeploymentState::Skipped);
        assert!(matches!(
            &report.errors[0],
            DeploymentError::MissingEnvVar { variable, .. } if variable == "TOKEN"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_names_abort_before_deploying() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());
        let a = zone("a");
        let b = zone("b").with_parameter("name", Parameter::value(json!("zone a")));

        let report = deploy(&service, vec![a, b, zone("c")]).await;

        assert!(api.calls().is_empty());
        assert_eq!(report.summary.excluded, 3);
        assert!(matches!(
            report.errors[0],
            DeploymentError::DuplicateIdentifier { .. }
        ));
    }

    /// Cancelling during the first call lets it finish and starts nothing new.
    #[tokio::test]
    async fn test_cancellation_stops_scheduling() {
        let cancel = CancellationSignal::new();
        let hook_signal = cancel.clone();
        let api = Arc::new(StubDeployApi::new().with_hook(move |_| hook_signal.cancel()));
        let service = service(api.clone()).with_config(DeploymentConfig {
            concurrency: 1,
            ..Default::default()
        });

        let report = service
            .deploy_environment(
                "prod",
                vec![zone("a"), referencing(zone("b"), "a"), zone("c")],
                &cancel,
            )
            .await;

        assert_eq!(api.calls(), vec![coord("a")]);
        assert_eq!(state(&report, "a"), DeploymentState::Success);
        assert_eq!(state(&report, "b"), DeploymentState::Excluded);
        assert_eq!(state(&report, "c"), DeploymentState::Excluded);
    }

    /// A panicking adapter fails its config; the worker keeps going.
    #[tokio::test]
    async fn test_adapter_panic_is_reported() {
        let api = Arc::new(StubDeployApi::new().with_hook(|coordinate| {
            if coordinate.config_id == "a" {
                panic!("connection pool poisoned");
            }
        }));
        let service = service(api.clone()).with_config(DeploymentConfig {
            concurrency: 1,
            ..Default::default()
        });

        let report = deploy(&service, vec![zone("a"), referencing(zone("b"), "a"), zone("c")]).await;

        assert!(!report.is_success());
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.summary.total(), 3);
        assert_eq!(state(&report, "a"), DeploymentState::Error);
        assert_eq!(state(&report, "b"), DeploymentState::Skipped);
        assert_eq!(state(&report, "c"), DeploymentState::Success);
        assert_eq!(api.calls(), vec![coord("c")]);
        assert!(matches!(
            &report.errors[..],
            [DeploymentError::AdapterPanicked { coordinate, .. }] if *coordinate == coord("a")
        ));
    }

    #[tokio::test]
    async fn test_dry_run_resolves_without_calls() {
        let api = Arc::new(StubDeployApi::new());
        let reporter = Arc::new(MemoryReporter::new());
        let service = service(api.clone())
            .with_reporter(reporter.clone())
            .with_config(DeploymentConfig {
                dry_run: true,
                ..Default::default()
            });

        let report = deploy(&service, vec![zone("a"), referencing(zone("b"), "a")]).await;

        assert!(report.is_success());
        assert!(api.calls().is_empty());
        let a_id = report.result(&coord("a")).and_then(ResolvedEntity::id).unwrap().to_string();
        let b = report.result(&coord("b")).unwrap();
        assert_eq!(b.properties["a_id"], json!(a_id));
        assert_eq!(reporter.events().len(), 2);
        assert_eq!(reporter.summaries()[0].1.success, 2);
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let api = Arc::new(StubDeployApi::new());
        api.fail(coord("b"), ApiError::from_status(404, "not found"));
        let metrics = DeploymentMetrics::new().unwrap();
        let service = service(api).with_metrics(metrics.clone());

        deploy(
            &service,
            vec![zone("a"), zone("b"), referencing(zone("c"), "b")],
        )
        .await;

        let text = metrics.gather_text().unwrap();
        assert!(text.contains(r#"keel_configs_deployed_total{state="success"} 1"#));
        assert!(text.contains(r#"keel_configs_deployed_total{state="error"} 1"#));
        assert!(text.contains(r#"keel_configs_deployed_total{state="skipped"} 1"#));
        assert!(text.contains("keel_deploy_duration_seconds_count 2"));
    }

    // =============================================================================
    // ENTITY MAP
    // =============================================================================

    #[test]
    fn test_entity_map_name_uniqueness() {
        let entities = EntityMap::new();
        let named = |id: &str| ResolvedEntity::new(coord(id), "shared", Default::default());

        entities.put(ResolvedEntity::skipped(coord("skipped")));
        entities.put(named("a"));
        entities.put(named("b"));

        assert!(entities.contains("management-zone", "shared"));
        assert!(!entities.contains("management-zone", ""));
        assert!(!entities.contains("dashboard", "shared"));
        assert_eq!(entities.len(), 3);
        assert_eq!(entities.get().len(), 3);
    }

    #[tokio::test]
    async fn test_environments_deploy_independently() {
        let api = Arc::new(StubDeployApi::new());
        let service = service(api.clone());
        let mut environments = std::collections::BTreeMap::new();
        environments.insert("prod".to_string(), vec![zone("a")]);
        environments.insert("staging".to_string(), vec![zone("a"), referencing(zone("b"), "a")]);

        let reports = service
            .deploy_environments(environments, &CancellationSignal::new())
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(DeploymentReport::is_success));
        assert_eq!(reports[1].summary.success, 2);
        assert_eq!(api.calls().len(), 3);
    }
}
