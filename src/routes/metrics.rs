//! Prometheus scrape endpoint.

use axum::{extract::State, response::IntoResponse};
use http::header::CONTENT_TYPE;
use prometheus::{Encoder, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Renders the registry in the Prometheus text exposition format.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&state.registry.gather(), &mut buffer)?;

    Ok(([(CONTENT_TYPE, encoder.format_type().to_string())], buffer))
}
