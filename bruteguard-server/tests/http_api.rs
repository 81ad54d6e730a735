//! End-to-end tests over the in-process HTTP router.
//!
//! Timing-sensitive flows run under a paused tokio clock, so owed delays
//! auto-advance instead of sleeping for real.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use bruteguard::{MemoryStore, ThrottleConfig, ThrottleEngine};
use bruteguard_server::metrics::Metrics;
use bruteguard_server::transport::http::{AppState, router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(config: ThrottleConfig) -> Router {
    let store = MemoryStore::builder().window(config.time_window).build();
    let state = AppState {
        engine: Arc::new(ThrottleEngine::new(store, config).unwrap()),
        metrics: Arc::new(Metrics::new()),
    };
    router(state)
}

fn tight_config() -> ThrottleConfig {
    ThrottleConfig {
        allowed_retries: 1,
        initial_wait: Duration::from_millis(10),
        ..Default::default()
    }
}

fn post(uri: &str, remote: [u8; 4], body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .extension(ConnectInfo(SocketAddr::from((remote, 4000))))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, remote: [u8; 4]) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from((remote, 4000))))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app(ThrottleConfig::default());
    let response = app.oneshot(get("/health", [127, 0, 0, 1])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn first_check_is_allowed_without_delay() {
    let app = app(ThrottleConfig::default());
    let response = app
        .oneshot(post("/check", [203, 0, 113, 7], json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::RETRY_AFTER).is_none());

    let body = body_json(response).await;
    assert_eq!(body["allowed"], json!(true));
    assert_eq!(body["waited_ms"], json!(0));
}

#[tokio::test(start_paused = true)]
async fn repeated_checks_delay_then_lock_out() {
    let app = app(tight_config());
    let remote = [203, 0, 113, 7];

    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Ceiling of 1 retry exceeded: locked out with a Retry-After close to
    // the full window
    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 300_000);

    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Too Many Requests"));
    assert_eq!(body["status_code"], json!(429));

    // A different address is unaffected
    let response = app
        .clone()
        .oneshot(post("/check", [203, 0, 113, 8], json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_the_lockout() {
    let app = app(tight_config());
    let remote = [203, 0, 113, 7];

    for _ in 0..2 {
        app.clone()
            .oneshot(post("/check", remote, json!({})))
            .await
            .unwrap();
    }
    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(post("/reset", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Back to a first observation
    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["waited_ms"], json!(0));
}

#[tokio::test(start_paused = true)]
async fn custom_key_identities_are_isolated() {
    let app = app(tight_config());
    let remote = [203, 0, 113, 7];

    for _ in 0..2 {
        app.clone()
            .oneshot(post(
                "/check",
                remote,
                json!({"key": "username", "value": "alice"}),
            ))
            .await
            .unwrap();
    }
    let response = app
        .clone()
        .oneshot(post(
            "/check",
            remote,
            json!({"key": "username", "value": "alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Same key, different value: a separate record, even from the same
    // address
    let response = app
        .clone()
        .oneshot(post(
            "/check",
            remote,
            json!({"key": "username", "value": "bob"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn custom_key_without_value_is_a_server_error() {
    let app = app(ThrottleConfig::default());
    let response = app
        .oneshot(post("/check", [203, 0, 113, 7], json!({"key": "username"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_overrides_fail_the_call() {
    let app = app(ThrottleConfig::default());

    // Zero wait is rejected by validation
    let response = app
        .clone()
        .oneshot(post(
            "/check",
            [203, 0, 113, 7],
            json!({"config": {"initial_wait_ms": 0}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Non-numeric wait never deserializes
    let response = app
        .clone()
        .oneshot(post(
            "/check",
            [203, 0, 113, 7],
            json!({"config": {"initial_wait_ms": "alot"}}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test(start_paused = true)]
async fn forwarded_address_is_resolved_through_proxies() {
    let config = ThrottleConfig {
        proxy_count: 2,
        ..tight_config()
    };
    let app = app(config);
    let header_value = "129.78.138.66, 129.78.64.103, 10.100.0.123";

    // Different transport addresses, same forwarded client: one identity
    for remote in [[10, 0, 0, 1], [10, 0, 0, 2]] {
        let request = Request::builder()
            .method("POST")
            .uri("/check")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", header_value)
            .extension(ConnectInfo(SocketAddr::from((remote, 4000))))
            .body(Body::from(json!({}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/check")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", header_value)
        .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 3], 4000))))
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different forwarded client starts fresh
    let request = Request::builder()
        .method("POST")
        .uri("/check")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "129.78.138.67, 129.78.64.103, 10.100.0.123")
        .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 3], 4000))))
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn pre_check_rejects_before_the_handler() {
    let config = ThrottleConfig {
        pre_response: true,
        ..tight_config()
    };
    let app = app(config);
    let remote = [203, 0, 113, 7];

    // First request passes the pre-check and the handler consumes a second
    // attempt; the next request is already over the ceiling at the pre-check
    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/check", remote, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health stays reachable regardless
    let response = app.clone().oneshot(get("/health", remote)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn metrics_report_decisions() {
    let app = app(tight_config());
    let remote = [203, 0, 113, 7];

    for _ in 0..3 {
        app.clone()
            .oneshot(post("/check", remote, json!({})))
            .await
            .unwrap();
    }
    app.clone()
        .oneshot(post("/reset", remote, json!({})))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/metrics", remote)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["checks_allowed"], json!(1));
    assert_eq!(body["checks_delayed"], json!(1));
    assert_eq!(body["checks_rejected"], json!(1));
    assert_eq!(body["resets"], json!(1));
}
