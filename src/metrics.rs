//! Prometheus collectors for the health endpoint.
//!
//! The collectors are owned by [`HealthMetrics`] and registered into a
//! caller-supplied [`Registry`], so every router instance (and every test)
//! gets an isolated set of series.

use std::net::SocketAddr;
use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

pub const HEALTH_REQUESTS_TOTAL: &str = "health_requests_total";
pub const HEALTH_REQUEST_DURATION_SECONDS: &str = "health_request_duration_seconds";

/// Request counter and latency histogram for `/health`.
#[derive(Clone)]
pub struct HealthMetrics {
    pod: String,
    pub requests_total: IntCounterVec,
    pub request_duration: HistogramVec,
}

impl HealthMetrics {
    /// Creates the collectors, labelling every sample with `pod`.
    pub fn new(pod: impl Into<String>) -> prometheus::Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                HEALTH_REQUESTS_TOTAL,
                "Total requests handled by the /health endpoint.",
            ),
            &["pod", "remote_ip"],
        )?;

        // HistogramOpts::new starts from prometheus::DEFAULT_BUCKETS
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                HEALTH_REQUEST_DURATION_SECONDS,
                "Duration of the /health handler in seconds.",
            ),
            &["pod"],
        )?;

        Ok(Self {
            pod: pod.into(),
            requests_total,
            request_duration,
        })
    }

    /// Registers both collectors. Fails if either is already registered.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.requests_total.clone()))?;
        registry.register(Box::new(self.request_duration.clone()))?;
        Ok(())
    }

    pub fn pod(&self) -> &str {
        &self.pod
    }

    /// Records one completed health request.
    pub fn observe(&self, remote_ip: &str, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[self.pod.as_str(), remote_ip])
            .inc();
        self.request_duration
            .with_label_values(&[self.pod.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}

/// Strips the port from a `host:port` remote address.
///
/// IPv4 peers on a dual-stack listener arrive as `::ffff:a.b.c.d` and are
/// reported in plain IPv4 form. Falls back to the raw string when it does
/// not parse as a socket address.
pub fn extract_remote_ip(remote_addr: &str) -> String {
    match remote_addr.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_canonical().to_string(),
        Err(_) => remote_addr.to_string(),
    }
}
