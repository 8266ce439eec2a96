//! Pod identity endpoint.
//!
//! Reports where this replica is running: environment, pod name/IP, node,
//! namespace, host name, and the current UTC time. Everything except the
//! host name and clock comes from the Downward API environment variables.

use axum::{extract::State, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Env, EnvKey};
use crate::state::AppState;

/// Identity snapshot returned by `/whoami`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityReport {
    pub environment: String,
    #[serde(rename = "podName")]
    pub pod_name: String,
    #[serde(rename = "podIP")]
    pub pod_ip: String,
    #[serde(rename = "nodeName")]
    pub node_name: String,
    pub namespace: String,
    pub hostname: String,
    #[serde(rename = "timeUtc")]
    pub time_utc: String,
}

impl IdentityReport {
    /// Assembles a report from `env`, a host name, and a point in time.
    pub fn collect(env: &Env, hostname: String, now: DateTime<Utc>) -> Self {
        Self {
            environment: env.value(EnvKey::Environment),
            pod_name: env.value(EnvKey::PodName),
            pod_ip: env.value(EnvKey::PodIp),
            node_name: env.value(EnvKey::NodeName),
            namespace: env.value(EnvKey::PodNamespace),
            hostname,
            time_utc: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Report for this host at the current instant.
    pub fn current(env: &Env) -> Self {
        Self::collect(env, local_hostname(), Utc::now())
    }
}

/// Best-effort local host name; empty when it cannot be determined.
pub fn local_hostname() -> String {
    // gethostname panics if the underlying syscall fails
    match std::panic::catch_unwind(gethostname::gethostname) {
        Ok(name) => name.into_string().unwrap_or_else(|raw| {
            tracing::warn!(hostname = ?raw, "Host name is not valid UTF-8");
            String::new()
        }),
        Err(_) => {
            tracing::warn!("Host name lookup failed");
            String::new()
        }
    }
}

/// Identity handler.
pub async fn whoami(State(state): State<AppState>) -> Json<IdentityReport> {
    Json(IdentityReport::current(&state.env))
}
