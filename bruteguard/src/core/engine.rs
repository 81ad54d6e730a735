//! The attempt-bookkeeping and delay-scheduling engine
//!
//! This module provides the main [`ThrottleEngine`] struct: the per-identity
//! state machine that counts attempts in a sliding window, schedules the
//! mandatory wait owed before an attempt may continue, and rejects identities
//! that have exhausted their retry ceiling.

use super::config::{ThrottleConfig, ThrottleOverrides};
use super::delay::DelayCurves;
use super::identity::Identity;
use super::store::{AttemptRecord, AttemptStore};
use super::ThrottleError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Outcome of a single throttle check.
///
/// A rejection is the intended throttling outcome, not a failure; it carries
/// the minimum duration the caller should communicate as `Retry-After`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed immediately; no wait was owed.
    Allow,
    /// Proceed after serving the given mandatory wait.
    AllowAfter(Duration),
    /// The retry ceiling is exceeded within the window.
    Reject { retry_after: Duration },
}

impl Decision {
    /// True unless the decision is a rejection.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Reject { .. })
    }

    /// The wait served before an allowed check returned, if any.
    pub fn waited(&self) -> Duration {
        match self {
            Decision::AllowAfter(wait) => *wait,
            _ => Duration::ZERO,
        }
    }
}

/// Attempt-throttling engine
///
/// Generic over an [`AttemptStore`], which holds one [`AttemptRecord`] per
/// identity under the store's TTL. The engine itself keeps no per-identity
/// state beyond the memoized delay curves.
///
/// # Example
///
/// ```
/// use bruteguard::{Identity, MemoryStore, ThrottleConfig, ThrottleEngine};
///
/// # tokio_test::block_on(async {
/// let engine = ThrottleEngine::new(MemoryStore::new(), ThrottleConfig::default()).unwrap();
/// let identity = Identity::from_request(None, "203.0.113.7", 0);
///
/// // First observation of an identity is always allowed with zero delay
/// let decision = engine.check(&identity).await.unwrap();
/// assert!(decision.is_allowed());
/// # });
/// ```
pub struct ThrottleEngine<S> {
    store: S,
    defaults: ThrottleConfig,
    curves: DelayCurves,
}

impl<S: AttemptStore> ThrottleEngine<S> {
    /// Create an engine over `store` with validated process-wide defaults.
    pub fn new(store: S, defaults: ThrottleConfig) -> Result<Self, ThrottleError> {
        defaults.validate()?;
        Ok(ThrottleEngine {
            store,
            defaults,
            curves: DelayCurves::new(),
        })
    }

    /// The process-wide default configuration.
    pub fn defaults(&self) -> &ThrottleConfig {
        &self.defaults
    }

    /// The underlying attempt store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check `identity` against the default configuration, serving any owed
    /// wait before returning.
    pub async fn check(&self, identity: &Identity) -> Result<Decision, ThrottleError> {
        let decision = self.check_at(identity, &self.defaults, SystemTime::now()).await?;
        self.serve(decision).await;
        Ok(decision)
    }

    /// Check `identity` with per-call overrides merged over the defaults.
    ///
    /// The overrides are validated independently before the merge; a
    /// malformed option fails the call before any store access.
    pub async fn check_with(
        &self,
        identity: &Identity,
        overrides: &ThrottleOverrides,
    ) -> Result<Decision, ThrottleError> {
        overrides.validate()?;
        let config = self.defaults.merged(overrides);
        let decision = self.check_at(identity, &config, SystemTime::now()).await?;
        self.serve(decision).await;
        Ok(decision)
    }

    /// Evaluate one check at an explicit instant, without sleeping.
    ///
    /// This is the clock-explicit building block beneath [`check`] and
    /// [`check_with`]; callers that serve delays themselves (or tests pinning
    /// the clock) use it directly.
    ///
    /// One read and one write against the store, with no lock spanning them:
    /// concurrent checks on the same identity can interleave and under- or
    /// double-count an attempt. The engine delegates atomicity entirely to
    /// the store.
    ///
    /// [`check`]: ThrottleEngine::check
    /// [`check_with`]: ThrottleEngine::check_with
    pub async fn check_at(
        &self,
        identity: &Identity,
        config: &ThrottleConfig,
        now: SystemTime,
    ) -> Result<Decision, ThrottleError> {
        config.validate()?;

        let key = identity.storage_key();
        let now_ms = unix_millis(now);

        let Some(cached) = self.store.get(&key).await? else {
            // Never seen (or expired): start tracking, no delay owed
            let record = AttemptRecord {
                attempts: 0,
                last_attempt_at: now_ms,
            };
            self.store.set(&key, record, None).await?;
            tracing::debug!(identity = %identity, "first attempt observed");
            return Ok(Decision::Allow);
        };

        let curve = self.curves.get(config);
        let record = cached.record;

        // Remaining mandatory wait not yet served. Past the curve end the
        // identity is already locked out and owes nothing new.
        let elapsed = now_ms.saturating_sub(record.last_attempt_at);
        let owed = curve
            .get(record.attempts as usize)
            .map(|delay| delay.as_millis() as i64 - elapsed)
            .unwrap_or(0);

        let attempts = record.attempts.saturating_add(1);
        let rejected = attempts > config.allowed_retries;

        // Persist regardless of outcome: the counter keeps growing while
        // locked out, every write refreshes the window, and an unserved wait
        // pre-charges the anchor into the future so rapid retries cannot
        // reset the penalty clock.
        let updated = AttemptRecord {
            attempts,
            last_attempt_at: now_ms + owed.max(0),
        };
        self.store.set(&key, updated, None).await?;

        if rejected {
            tracing::debug!(
                identity = %identity,
                attempts,
                retry_after_ms = cached.ttl_remaining.as_millis() as u64,
                "attempt rejected"
            );
            return Ok(Decision::Reject {
                retry_after: cached.ttl_remaining,
            });
        }

        if owed > 0 {
            tracing::trace!(identity = %identity, attempts, owed_ms = owed, "attempt delayed");
            Ok(Decision::AllowAfter(Duration::from_millis(owed as u64)))
        } else {
            Ok(Decision::Allow)
        }
    }

    /// Forget `identity` entirely; it behaves as never seen afterwards.
    pub async fn reset(&self, identity: &Identity) -> Result<(), ThrottleError> {
        self.store.remove(&identity.storage_key()).await?;
        tracing::debug!(identity = %identity, "attempt record reset");
        Ok(())
    }

    /// Suspend the calling task for the wait a decision carries.
    ///
    /// A non-blocking suspension of this task only; other checks, including
    /// on the same identity, proceed concurrently.
    pub(crate) async fn serve(&self, decision: Decision) {
        if let Decision::AllowAfter(wait) = decision {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Milliseconds since the unix epoch.
///
/// A clock before the epoch reads as zero rather than failing the check.
fn unix_millis(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
