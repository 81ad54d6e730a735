//! Common wire types for the HTTP API
//!
//! Requests and responses are JSON. A check either passes (200, with the
//! delay that was served) or is rejected (429 with a `Retry-After` header
//! carrying milliseconds); engine failures surface as 500s.

use bruteguard::{Decision, ThrottleOverrides};
use serde::{Deserialize, Serialize};

/// A throttle check for one identity
///
/// Without `key`, the identity is the proxy-aware client address. With
/// `key` (e.g. `"username"`), `value` must carry the non-empty identity
/// value. `config` optionally overrides the process defaults for this call
/// only; unknown or malformed fields fail the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Custom identity key (default: client address)
    pub key: Option<String>,
    /// Identity value, required with a custom key
    pub value: Option<String>,
    /// Per-call configuration overrides
    pub config: Option<ThrottleOverrides>,
}

/// Response to an allowed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Always true; rejections use the 429 shape instead
    pub allowed: bool,
    /// Mandatory wait served before this response (0 if none was owed)
    pub waited_ms: u64,
}

impl From<Decision> for CheckResponse {
    fn from(decision: Decision) -> Self {
        CheckResponse {
            allowed: decision.is_allowed(),
            waited_ms: decision.waited().as_millis() as u64,
        }
    }
}

/// Forget one identity's attempt record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    /// Custom identity key (default: client address)
    pub key: Option<String>,
    /// Identity value, required with a custom key
    pub value: Option<String>,
}

/// Body of a 429 rejection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectResponse {
    pub status_code: u16,
    pub error: String,
    pub message: String,
    /// Minimum wait before retrying, also sent as the Retry-After header
    pub retry_after_ms: u64,
}

impl RejectResponse {
    pub fn new(retry_after_ms: u64) -> Self {
        RejectResponse {
            status_code: 429,
            error: "Too Many Requests".to_string(),
            message: "you have exceeded your request limit".to_string(),
            retry_after_ms,
        }
    }
}

/// Error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}
