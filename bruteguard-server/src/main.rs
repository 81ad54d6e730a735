mod config;
mod metrics;
mod transport;
mod types;

use anyhow::Result;
use bruteguard::{MemoryStore, ThrottleEngine};
use std::sync::Arc;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::transport::{Transport, http::AppState, http::HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("bruteguard={}", config.log_level).parse()?)
                .add_directive(format!("bruteguard_server={}", config.log_level).parse()?),
        )
        .init();

    // The store's default window is the throttle window: every write
    // refreshes it, which is what makes the window slide
    let store = MemoryStore::builder()
        .capacity(config.store.capacity)
        .window(config.throttle.time_window)
        .cleanup_interval(config.store.cleanup_interval)
        .build();
    let engine = ThrottleEngine::new(store, config.throttle.clone())?;

    let state = AppState {
        engine: Arc::new(engine),
        metrics: Arc::new(Metrics::new()),
    };

    tracing::info!(
        "Bruteguard started: {} retries allowed, {}ms initial wait, {}s window, pre-response {}",
        config.throttle.allowed_retries,
        config.throttle.initial_wait.as_millis(),
        config.throttle.time_window.as_secs(),
        if config.throttle.pre_response { "on" } else { "off" }
    );

    let transport = HttpTransport::new(&config.http.host, config.http.port);
    transport.start(state).await
}
