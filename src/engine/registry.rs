use super::{NullEngine, SharedEngine};
use crate::config::EngineConfig;
use crate::nats::NatsEngine;
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Async constructor for an engine
pub type EngineFactory =
    Arc<dyn Fn(EngineConfig) -> BoxFuture<'static, Result<SharedEngine>> + Send + Sync>;

/// Name → factory mapping, populated during startup
#[derive(Clone, Default)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `nats` and `null` engines
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register("nats", |cfg| {
            Box::pin(async move {
                let engine = NatsEngine::connect(&cfg).await?;
                Ok::<SharedEngine, anyhow::Error>(Arc::new(engine))
            })
        });

        registry.register("null", |_cfg| {
            Box::pin(async { Ok::<SharedEngine, anyhow::Error>(Arc::new(NullEngine)) })
        });

        registry
    }

    /// Register a factory, replacing any existing one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(EngineConfig) -> BoxFuture<'static, Result<SharedEngine>> + Send + Sync + 'static,
    {
        let name = name.into();
        info!("Registering engine factory: {}", name);
        self.factories.insert(name, Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the engine registered under `name`
    pub async fn create(&self, name: &str, config: EngineConfig) -> Result<SharedEngine> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "Unknown engine kind {:?} (available: {})",
                name,
                self.names().join(", ")
            )
        })?;

        info!("Creating engine: {}", name);
        factory(config).await
    }
}
