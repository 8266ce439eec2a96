//! podwhoami - pod identity reporter
//!
//! A small HTTP service meant to run inside a Kubernetes pod. It reports the
//! pod's identity (`/whoami`), answers liveness probes (`/health`) and exposes
//! Prometheus metrics for the health endpoint (`/metrics`).

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::*;
