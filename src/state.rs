//! Shared application state for request handlers.

use prometheus::Registry;

use crate::config::{Env, EnvKey};
use crate::metrics::HealthMetrics;

/// Shared application state, cheap to clone across handlers.
///
/// Holds the environment reader, the Prometheus registry scraped by
/// `/metrics`, and the health collectors registered into it. On Linux the
/// registry also carries the standard `process_*` collector.
#[derive(Clone)]
pub struct AppState {
    pub env: Env,
    pub registry: Registry,
    pub metrics: HealthMetrics,
}

impl AppState {
    /// Creates state with a fresh registry and registers the health collectors.
    pub fn new(env: Env) -> prometheus::Result<Self> {
        let registry = Registry::new();
        let metrics = HealthMetrics::new(env.value(EnvKey::PodName))?;
        metrics.register(&registry)?;
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            env,
            registry,
            metrics,
        })
    }
}
