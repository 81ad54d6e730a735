//! HTTP/JSON transport for the throttling service
//!
//! # API Endpoints
//!
//! ## POST /check
//!
//! Consume one attempt for an identity.
//!
//! ### Request Body
//!
//! ```json
//! {
//!   "key": "username",
//!   "value": "alice",
//!   "config": { "allowed_retries": 3, "initial_wait_ms": 200 }
//! }
//! ```
//!
//! All fields are optional. Without `key` the identity is the proxy-aware
//! client address (honoring `X-Forwarded-For` up to the configured trusted
//! proxy depth). `config` overrides the process defaults for this call only.
//!
//! ### Responses
//!
//! Allowed (after serving any owed delay):
//!
//! ```json
//! { "allowed": true, "waited_ms": 200 }
//! ```
//!
//! Locked out: status 429 with a `Retry-After` header (milliseconds) and
//!
//! ```json
//! {
//!   "status_code": 429,
//!   "error": "Too Many Requests",
//!   "message": "you have exceeded your request limit",
//!   "retry_after_ms": 359800
//! }
//! ```
//!
//! ## POST /reset
//!
//! Forget an identity's attempt record; body is `{key?, value?}` as above.
//! Returns 204.
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status.
//!
//! ## GET /metrics
//!
//! JSON snapshot of the decision counters.
//!
//! # Pre-check middleware
//!
//! With `pre_response` enabled, every request to the throttled routes first
//! passes an address-keyed check; a locked-out caller receives the 429 before
//! any handler runs.

use super::Transport;
use crate::metrics::Metrics;
use crate::types::{CheckRequest, CheckResponse, HttpErrorResponse, RejectResponse, ResetRequest};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use bruteguard::{Decision, Identity, MemoryStore, ThrottleEngine, ThrottleError};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared application state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ThrottleEngine<MemoryStore>>,
    pub metrics: Arc<Metrics>,
}

/// HTTP transport implementation
pub struct HttpTransport {
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        let addr = format!("{host}:{port}").parse().expect("Invalid address");
        Self { addr }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, state: AppState) -> Result<()> {
        let app = router(state);

        tracing::info!("HTTP server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}

/// Build the service router.
///
/// The pre-check middleware is attached to the throttled routes only when
/// the process defaults enable `pre_response`; `/health` and `/metrics` are
/// never throttled.
pub fn router(state: AppState) -> Router {
    let mut throttled = Router::new()
        .route("/check", post(handle_check))
        .route("/reset", post(handle_reset));

    if state.engine.defaults().pre_response {
        throttled = throttled.layer(middleware::from_fn_with_state(state.clone(), pre_check));
    }

    Router::new()
        .merge(throttled)
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
}

/// Global pre-processing check, keyed by client address.
///
/// Consumes one attempt per request before the handler runs, exactly like
/// the on-demand check would.
async fn pre_check(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let identity = Identity::from_request(
        forwarded_for(req.headers()).as_deref(),
        &remote,
        state.engine.defaults().proxy_count,
    );

    match state.engine.check(&identity).await {
        Ok(Decision::Reject { retry_after }) => {
            state
                .metrics
                .record_decision(&Decision::Reject { retry_after });
            reject_response(retry_after.as_millis() as u64)
        }
        Ok(decision) => {
            state.metrics.record_decision(&decision);
            next.run(req).await
        }
        Err(err) => {
            state.metrics.record_error();
            error_response(&err)
        }
    }
}

async fn handle_check(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CheckRequest>,
) -> Response {
    let overrides = req.config.unwrap_or_default();
    if let Err(err) = overrides.validate() {
        state.metrics.record_error();
        return error_response(&err);
    }

    // The trusted proxy depth may itself be overridden per call
    let proxy_count = state.engine.defaults().merged(&overrides).proxy_count;
    let identity = match resolve_identity(
        req.key.as_deref(),
        req.value.as_deref(),
        &headers,
        addr,
        proxy_count,
    ) {
        Ok(identity) => identity,
        Err(err) => {
            state.metrics.record_error();
            return error_response(&err);
        }
    };

    match state.engine.check_with(&identity, &overrides).await {
        Ok(Decision::Reject { retry_after }) => {
            state
                .metrics
                .record_decision(&Decision::Reject { retry_after });
            reject_response(retry_after.as_millis() as u64)
        }
        Ok(decision) => {
            state.metrics.record_decision(&decision);
            (StatusCode::OK, Json(CheckResponse::from(decision))).into_response()
        }
        Err(err) => {
            state.metrics.record_error();
            error_response(&err)
        }
    }
}

async fn handle_reset(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ResetRequest>,
) -> Response {
    let identity = match resolve_identity(
        req.key.as_deref(),
        req.value.as_deref(),
        &headers,
        addr,
        state.engine.defaults().proxy_count,
    ) {
        Ok(identity) => identity,
        Err(err) => {
            state.metrics.record_error();
            return error_response(&err);
        }
    };

    match state.engine.reset(&identity).await {
        Ok(()) => {
            state.metrics.record_reset();
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            state.metrics.record_error();
            error_response(&err)
        }
    }
}

async fn handle_metrics(State(state): State<AppState>) -> Response {
    Json(state.metrics.snapshot()).into_response()
}

/// Resolve the identity a request is throttled under.
///
/// `key` of `"ip"` (or none) selects address mode; any other key requires a
/// non-empty `value`.
fn resolve_identity(
    key: Option<&str>,
    value: Option<&str>,
    headers: &HeaderMap,
    addr: SocketAddr,
    proxy_count: usize,
) -> Result<Identity, ThrottleError> {
    match key {
        Some(key) if key != "ip" => Identity::custom(key, value.unwrap_or_default()),
        _ => Ok(Identity::from_request(
            forwarded_for(headers).as_deref(),
            &addr.ip().to_string(),
            proxy_count,
        )),
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn reject_response(retry_after_ms: u64) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_ms.to_string())],
        Json(RejectResponse::new(retry_after_ms)),
    )
        .into_response()
}

fn error_response(err: &ThrottleError) -> Response {
    tracing::error!("throttle operation failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(HttpErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
