//! HTTP route handlers.
//!
//! Three fixed GET routes plus a JSON 404 fallback. All routes share the
//! same middleware stack; the metrics layer only measures `/health`.

pub mod health;
pub mod metrics;
pub mod whoami;

use axum::{http::Uri, middleware, routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::{handle_panic, AppError};
use crate::metrics::HealthMetrics;
use crate::middleware::{health_metrics_layer, request_id_layer};
use crate::state::AppState;

pub const HEALTH_PATH: &str = "/health";
pub const WHOAMI_PATH: &str = "/whoami";
pub const METRICS_PATH: &str = "/metrics";

/// Binds the routes to their handlers, without middleware.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health::health))
        .route(WHOAMI_PATH, get(whoami::whoami))
        .route(METRICS_PATH, get(metrics::metrics))
        .fallback(not_found)
        .with_state(state)
}

/// Applies the middleware stack to `router`.
///
/// Layers run outermost first: panic recovery, request span, health metrics.
pub fn apply_layers(router: Router, metrics: HealthMetrics) -> Router {
    router
        // Health metrics - filters on MatchedPath, which the router sets before layers run
        .layer(middleware::from_fn_with_state(metrics, health_metrics_layer))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
        // Panic recovery - turns handler panics into 500 responses
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Creates the Axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    apply_layers(api_routes(state), metrics)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
