//! Health check endpoint for container orchestration.
//!
//! A liveness probe: it only checks that the process can respond to HTTP,
//! and names the pod that answered.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::{Env, EnvKey};
use crate::state::AppState;

pub const STATUS_OK: &str = "ok";

/// Liveness payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: &'static str,
    pub pod: String,
}

impl HealthReport {
    pub fn from_env(env: &Env) -> Self {
        Self {
            status: STATUS_OK,
            pod: env.value(EnvKey::PodName),
        }
    }
}

/// Health check handler.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::from_env(&state.env))
}
