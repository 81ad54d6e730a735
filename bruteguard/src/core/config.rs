//! Throttle configuration, validation and per-call overrides
//!
//! A [`ThrottleConfig`] holds the process-wide defaults an engine is built
//! with. Call sites may supply a [`ThrottleOverrides`] — a partial mirror of
//! the config — which is validated on its own and then merged shallowly, the
//! override winning per field.

use super::ThrottleError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ALLOWED_RETRIES: u32 = 5;
const DEFAULT_INITIAL_WAIT: Duration = Duration::from_millis(100);
const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(15_000);
const DEFAULT_TIME_WINDOW: Duration = Duration::from_millis(360_000);

/// Throttling parameters for one engine or one call site.
///
/// # Fields
///
/// - `allowed_retries`: checks allowed beyond the first before lockout
/// - `initial_wait`: first mandatory delay; seeds the delay curve
/// - `max_wait`: elementwise cap on the delay curve
/// - `time_window`: store TTL refreshed on every write — the sliding
///   inactivity window after which an identity is forgotten
/// - `proxy_count`: trusted proxy depth for forwarded-address resolution
/// - `pre_response`: whether the integration layer should run the global
///   pre-check on every request (the engine itself never reads this)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub allowed_retries: u32,
    pub initial_wait: Duration,
    pub max_wait: Duration,
    pub time_window: Duration,
    pub proxy_count: usize,
    pub pre_response: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        ThrottleConfig {
            allowed_retries: DEFAULT_ALLOWED_RETRIES,
            initial_wait: DEFAULT_INITIAL_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            time_window: DEFAULT_TIME_WINDOW,
            proxy_count: 0,
            pre_response: false,
        }
    }
}

impl ThrottleConfig {
    /// Validate the configuration.
    ///
    /// `allowed_retries` must be at least 1 and every duration strictly
    /// positive. Runs before any store access on every check.
    pub fn validate(&self) -> Result<(), ThrottleError> {
        if self.allowed_retries == 0 {
            return Err(ThrottleError::ConfigValidation(
                "allowed_retries must be at least 1".into(),
            ));
        }
        if self.initial_wait.is_zero() {
            return Err(ThrottleError::ConfigValidation(
                "initial_wait must be positive".into(),
            ));
        }
        if self.max_wait.is_zero() {
            return Err(ThrottleError::ConfigValidation(
                "max_wait must be positive".into(),
            ));
        }
        if self.time_window.is_zero() {
            return Err(ThrottleError::ConfigValidation(
                "time_window must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Shallow merge: fields present in `overrides` replace the defaults.
    pub fn merged(&self, overrides: &ThrottleOverrides) -> ThrottleConfig {
        ThrottleConfig {
            allowed_retries: overrides.allowed_retries.unwrap_or(self.allowed_retries),
            initial_wait: overrides
                .initial_wait_ms
                .map(Duration::from_millis)
                .unwrap_or(self.initial_wait),
            max_wait: overrides
                .max_wait_ms
                .map(Duration::from_millis)
                .unwrap_or(self.max_wait),
            time_window: overrides
                .time_window_ms
                .map(Duration::from_millis)
                .unwrap_or(self.time_window),
            proxy_count: overrides.proxy_count.unwrap_or(self.proxy_count),
            pre_response: overrides.pre_response.unwrap_or(self.pre_response),
        }
    }
}

/// Per-call configuration overrides.
///
/// Deserialized from call-site configuration (e.g. a JSON request body).
/// Unknown fields are rejected rather than ignored, and the overrides are
/// validated on their own before merging — a malformed call-site option must
/// fail the call, not fall back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleOverrides {
    pub allowed_retries: Option<u32>,
    pub initial_wait_ms: Option<u64>,
    pub max_wait_ms: Option<u64>,
    pub time_window_ms: Option<u64>,
    pub proxy_count: Option<usize>,
    pub pre_response: Option<bool>,
}

impl ThrottleOverrides {
    /// Validate the fields that are present.
    pub fn validate(&self) -> Result<(), ThrottleError> {
        if self.allowed_retries == Some(0) {
            return Err(ThrottleError::ConfigValidation(
                "allowed_retries must be at least 1".into(),
            ));
        }
        if self.initial_wait_ms == Some(0) {
            return Err(ThrottleError::ConfigValidation(
                "initial_wait_ms must be positive".into(),
            ));
        }
        if self.max_wait_ms == Some(0) {
            return Err(ThrottleError::ConfigValidation(
                "max_wait_ms must be positive".into(),
            ));
        }
        if self.time_window_ms == Some(0) {
            return Err(ThrottleError::ConfigValidation(
                "time_window_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// True when no field is set, i.e. merging would be a no-op.
    pub fn is_empty(&self) -> bool {
        *self == ThrottleOverrides::default()
    }
}
