//! Core components of the bruteguard throttling library
//!
//! This module contains the fundamental building blocks:
//! - [`config`]: throttle configuration, validation and per-call overrides
//! - [`delay`]: the mandatory-wait curve and its memoization
//! - [`identity`]: proxy-aware identity resolution
//! - [`engine`]: the attempt-bookkeeping engine producing [`Decision`]s
//! - [`guard`]: guarded actions with an explicit reset handle
//! - [`store`]: the attempt store contract and the in-memory implementation

pub mod config;
pub mod delay;
pub mod engine;
pub mod guard;
pub mod identity;
pub mod store;


pub use config::{ThrottleConfig, ThrottleOverrides};
pub use delay::compute_delay_curve;
pub use engine::{Decision, ThrottleEngine};
pub use guard::{GuardOutcome, ResetHandle};
pub use identity::Identity;
pub use store::{AttemptRecord, AttemptStore, CachedRecord, MemoryStore, MemoryStoreBuilder};

use thiserror::Error;

/// Failure of a single underlying store operation.
///
/// Every store backend maps its own error type into this one, so the engine
/// sees exactly one failure shape. Store failures are never retried; the
/// state of the record after one is not assumed consistent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("store operation failed: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        StoreError(msg.into())
    }
}

/// Errors that can occur while checking or resetting an identity.
///
/// A lockout is deliberately *not* represented here: being throttled is the
/// intended outcome, surfaced as [`Decision::Reject`], and carries no fault.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// A configuration value failed validation. Fatal for the affected call;
    /// invalid options are never silently replaced with defaults.
    #[error("invalid throttle configuration: {0}")]
    ConfigValidation(String),

    /// The underlying attempt store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Identity resolution failed, e.g. a custom key without a value.
    /// Raised before any store access.
    #[error("identity resolution failed: {0}")]
    Identity(String),

    /// A caller-supplied guarded action panicked.
    #[error("guarded action failed: {0}")]
    Action(String),
}
