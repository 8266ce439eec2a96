//! In-process HTTP tests for the router.
//!
//! Requests are driven through `tower::ServiceExt::oneshot`, with the peer
//! address supplied as a `ConnectInfo` extension and the environment by a
//! fixed map.
//! Each test owns its own registry.
//!
//! Run with: cargo test --test http_routes
use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    routing::get,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use podwhoami::config::Env;
use podwhoami::routes::{api_routes, apply_layers, create_router};
use podwhoami::state::AppState;

const CALLER: ([u8; 4], u16) = ([10, 1, 2, 3], 54321);

fn test_state(vars: &[(&str, &str)]) -> AppState {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppState::new(Env::from_source(map)).unwrap()
}

/// Attaches the peer address the way `into_make_service_with_connect_info` does.
fn with_caller(router: Router) -> Router {
    router.layer(Extension(ConnectInfo(SocketAddr::from(CALLER))))
}

fn test_app(state: AppState) -> Router {
    with_caller(create_router(state))
}

async fn send(app: &Router, path: &str) -> (StatusCode, Bytes) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

async fn send_json(app: &Router, path: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, path).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn health_count(state: &AppState, pod: &str, ip: &str) -> u64 {
    state
        .metrics
        .requests_total
        .with_label_values(&[pod, ip])
        .get()
}

fn health_samples(state: &AppState, pod: &str) -> u64 {
    state
        .metrics
        .request_duration
        .with_label_values(&[pod])
        .get_sample_count()
}

#[tokio::test]
async fn test_health_reports_pod() {
    let app = test_app(test_state(&[("POD_NAME", "pod-7"), ("ENVIRONMENT", "staging")]));

    let (status, body) = send_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "pod": "pod-7"}));
}

#[tokio::test]
async fn test_health_without_environment() {
    let app = test_app(test_state(&[]));

    let (status, body) = send_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "pod": "unknown"}));
}

#[tokio::test]
async fn test_whoami_scenario() {
    let app = test_app(test_state(&[("POD_NAME", "pod-7"), ("ENVIRONMENT", "staging")]));

    let (status, body) = send_json(&app, "/whoami").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["podName"], "pod-7");
    assert_eq!(body["environment"], "staging");
    assert_eq!(body["podIP"], "unknown");
    assert_eq!(body["nodeName"], "unknown");
    assert_eq!(body["namespace"], "default");
    assert_eq!(
        body["hostname"],
        podwhoami::routes::whoami::local_hostname()
    );

    let time_utc = body["timeUtc"].as_str().unwrap();
    assert!(time_utc.ends_with('Z'), "not UTC: {}", time_utc);
    let reported = DateTime::parse_from_rfc3339(time_utc).unwrap();
    let skew = Utc::now().signed_duration_since(reported).num_seconds().abs();
    assert!(skew <= 5, "timeUtc {} is {}s from now", time_utc, skew);
}

#[tokio::test]
async fn test_whoami_fields_never_empty() {
    let configs: [&[(&str, &str)]; 3] = [
        &[],
        &[("POD_NAME", ""), ("POD_IP", ""), ("POD_NAMESPACE", "")],
        &[
            ("ENVIRONMENT", "prod"),
            ("POD_NAME", "api-0"),
            ("POD_IP", "10.244.0.9"),
            ("NODE_NAME", "node-a"),
            ("POD_NAMESPACE", "apps"),
        ],
    ];

    for vars in configs {
        let app = test_app(test_state(vars));
        let (_, body) = send_json(&app, "/whoami").await;
        for field in ["environment", "podName", "podIP", "nodeName", "namespace"] {
            let value = body[field].as_str().unwrap();
            assert!(!value.is_empty(), "{} empty for {:?}", field, vars);
        }
    }
}

#[tokio::test]
async fn test_whoami_time_is_non_decreasing() {
    let app = test_app(test_state(&[]));

    let mut previous = None;
    for _ in 0..5 {
        let (_, body) = send_json(&app, "/whoami").await;
        let current = DateTime::parse_from_rfc3339(body["timeUtc"].as_str().unwrap()).unwrap();
        if let Some(previous) = previous {
            assert!(current >= previous);
        }
        previous = Some(current);
    }
}

#[tokio::test]
async fn test_concurrent_health_calls_are_all_counted() {
    const CALLS: usize = 32;
    let state = test_state(&[("POD_NAME", "pod-7")]);
    let app = test_app(state.clone());

    let responses = join_all((0..CALLS).map(|_| send(&app, "/health"))).await;

    assert!(responses.iter().all(|(status, _)| *status == StatusCode::OK));
    assert_eq!(health_count(&state, "pod-7", "10.1.2.3"), CALLS as u64);
    assert_eq!(health_samples(&state, "pod-7"), CALLS as u64);
}

#[tokio::test]
async fn test_other_routes_are_not_measured() {
    let state = test_state(&[("POD_NAME", "pod-7")]);
    let app = test_app(state.clone());

    send(&app, "/health").await;
    assert_eq!(health_count(&state, "pod-7", "10.1.2.3"), 1);

    for path in ["/metrics", "/whoami", "/metrics", "/does-not-exist"] {
        send(&app, path).await;
    }

    assert_eq!(health_count(&state, "pod-7", "10.1.2.3"), 1);
    assert_eq!(health_samples(&state, "pod-7"), 1);
    assert_eq!(health_count(&state, "pod-7", "unknown"), 0);
}

#[tokio::test]
async fn test_metrics_exposes_health_series() {
    let app = test_app(test_state(&[("POD_NAME", "pod-7")]));

    send(&app, "/health").await;
    send(&app, "/health").await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{}", content_type);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("# TYPE health_requests_total counter"));
    assert!(text.contains(r#"health_requests_total{pod="pod-7",remote_ip="10.1.2.3"} 2"#));
    assert!(text.contains("# TYPE health_request_duration_seconds histogram"));
    assert!(text.contains(r#"health_request_duration_seconds_count{pod="pod-7"} 2"#));
    assert!(text.contains(r#"health_request_duration_seconds_bucket{pod="pod-7",le="+Inf"} 2"#));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_metrics_exposes_process_collector() {
    let app = test_app(test_state(&[]));

    let (status, body) = send(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("# TYPE process_start_time_seconds gauge"), "{}", text);
    assert!(text.contains("process_resident_memory_bytes"));
}

#[tokio::test]
async fn test_missing_peer_address_is_labelled_unknown() {
    let state = test_state(&[("POD_NAME", "pod-7")]);
    let app = create_router(state.clone());

    let (status, _) = send(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health_count(&state, "pod-7", "unknown"), 1);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app(test_state(&[]));

    let (status, body) = send_json(&app, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No route for /nope"}));
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_panic_becomes_500_and_server_keeps_serving() {
    let state = test_state(&[("POD_NAME", "pod-7")]);
    let routes = api_routes(state.clone()).route("/explode", get(explode));
    let app = with_caller(apply_layers(routes, state.metrics.clone()));

    let (status, body) = send_json(&app, "/explode").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let (status, body) = send_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
