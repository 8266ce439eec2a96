//! Request middleware.
//!
//! `request_id_layer` wraps every request in a tracing span keyed by a UUID v4;
//! the ID lives only in the span, so every log line of a request carries it.
//! `health_metrics_layer` records request count and latency for the `/health`
//! route and passes every other route through untouched.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::UNKNOWN;
use crate::metrics::{extract_remote_ip, HealthMetrics};
use crate::routes::HEALTH_PATH;

/// Middleware that wraps each request in a span carrying a fresh request ID.
///
/// Installed outside the metrics layer so the span covers it. Probes hit
/// `/health` every few seconds, so completion is logged at debug.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );
    let start = Instant::now();

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::debug!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await
}

/// Middleware that measures the `/health` route.
///
/// Filters on the matched route pattern rather than the raw path, so the
/// label set stays bounded. Requests that matched no route carry no
/// `MatchedPath` and are never measured.
pub async fn health_metrics_layer(
    State(metrics): State<HealthMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let is_health = request
        .extensions()
        .get::<MatchedPath>()
        .is_some_and(|matched| matched.as_str() == HEALTH_PATH);
    if !is_health {
        return next.run(request).await;
    }

    let start = Instant::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let mut remote_ip = extract_remote_ip(&remote_addr);
    if remote_ip.is_empty() {
        remote_ip = UNKNOWN.to_string();
    }

    let response = next.run(request).await;

    metrics.observe(&remote_ip, start.elapsed());
    tracing::trace!(remote_ip = %remote_ip, pod = %metrics.pod(), "Recorded health request");

    response
}
