//! Shared fixtures: config builders and a scripted deploy adapter.

use async_trait::async_trait;
use kd_02_deployment::{ApiError, DeployApi, DeployContext};
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;
use shared_types::{Config, Coordinate, Parameter, Properties, ResolvedEntity, ResourceType, Template};
use std::collections::{HashMap, VecDeque};

pub const PROJECT: &str = "infra";

pub fn coord(id: &str) -> Coordinate {
    Coordinate::new(PROJECT, "management-zone", id)
}

/// A management zone named after its id.
pub fn zone(id: &str) -> Config {
    Config::new(
        coord(id),
        ResourceType::ClassicApi {
            api: "management-zone".into(),
        },
        Template::new(format!("{id}.json"), r#"{"name": "{{ .name }}"}"#),
        "prod",
    )
    .with_parameter("name", Parameter::value(json!(format!("zone {id}"))))
}

/// `config` with a `<target>_id` parameter referencing the id of `target`.
pub fn referencing(config: Config, target: &str) -> Config {
    config.with_parameter(format!("{target}_id"), Parameter::reference(coord(target), "id"))
}

/// `n` zones where every zone references a few random earlier ones.
pub fn random_dag(n: usize, max_refs: usize, rng: &mut impl Rng) -> Vec<Config> {
    (0..n)
        .map(|i| {
            let mut config = zone(&format!("z{i:05}"));
            if i > 0 {
                for _ in 0..rng.gen_range(0..=max_refs) {
                    let target = rng.gen_range(0..i);
                    config = referencing(config, &format!("z{target:05}"));
                }
            }
            config
        })
        .collect()
}

type CallHook = Box<dyn Fn(&Coordinate) + Send + Sync>;

/// Deploy adapter with scripted outcomes per coordinate.
///
/// Once a coordinate's script is used up, calls succeed with
/// `id = "remote-<configId>"`.
#[derive(Default)]
pub struct StubDeployApi {
    scripts: Mutex<HashMap<Coordinate, VecDeque<Result<ResolvedEntity, ApiError>>>>,
    calls: Mutex<Vec<(Coordinate, Properties)>>,
    on_call: Option<CallHook>,
}

impl StubDeployApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` at the start of every call.
    pub fn with_hook(mut self, hook: impl Fn(&Coordinate) + Send + Sync + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    pub fn fail(&self, coordinate: Coordinate, error: ApiError) {
        self.scripts
            .lock()
            .entry(coordinate)
            .or_default()
            .push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<Coordinate> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn properties_of(&self, coordinate: &Coordinate) -> Option<Properties> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|(c, _)| c == coordinate)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl DeployApi for StubDeployApi {
    async fn deploy(
        &self,
        _ctx: &DeployContext,
        properties: &Properties,
        _rendered: &str,
        config: &Config,
    ) -> Result<ResolvedEntity, ApiError> {
        if let Some(hook) = &self.on_call {
            hook(&config.coordinate);
        }
        self.calls
            .lock()
            .push((config.coordinate.clone(), properties.clone()));

        let scripted = self
            .scripts
            .lock()
            .get_mut(&config.coordinate)
            .and_then(VecDeque::pop_front);

        scripted.unwrap_or_else(|| {
            Ok(ResolvedEntity::new(
                config.coordinate.clone(),
                config.literal_name().unwrap_or_default(),
                properties.clone(),
            )
            .with_property("id", format!("remote-{}", config.coordinate.config_id)))
        })
    }
}
