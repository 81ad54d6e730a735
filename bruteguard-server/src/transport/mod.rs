//! Transport layer for the throttling service
//!
//! Transports expose the shared engine state over a network protocol. Only
//! HTTP/JSON is implemented; additional protocols plug in through the
//! [`Transport`] trait.

pub mod http;

use crate::transport::http::AppState;
use anyhow::Result;
use async_trait::async_trait;

/// Common interface for transport implementations
#[async_trait]
pub trait Transport {
    /// Serve requests against the shared application state until shutdown
    /// or a fatal error.
    async fn start(self, state: AppState) -> Result<()>;
}
