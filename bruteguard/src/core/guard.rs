//! Guarded actions with an explicit reset handle
//!
//! A guarded action is the per-handler call site: the engine checks the
//! identity (serving any owed wait), then runs a caller-supplied async action
//! with a [`ResetHandle`] it can use to clear the identity's record — the
//! usual shape being "verify the credentials, reset the counter on success".
//! A panicking action is contained and converted to
//! [`ThrottleError::Action`]; it never propagates and never leaves the
//! engine's bookkeeping ambiguous.

use super::config::ThrottleOverrides;
use super::engine::{Decision, ThrottleEngine};
use super::identity::Identity;
use super::store::AttemptStore;
use super::ThrottleError;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Outcome of a guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    /// The check passed and the action ran to completion.
    Completed(T),
    /// The identity is locked out; the action was never invoked.
    Rejected { retry_after: Duration },
}

impl<T> GuardOutcome<T> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, GuardOutcome::Rejected { .. })
    }
}

/// Handle for resetting one identity's attempt record.
///
/// Handed to the guarded action; resetting returns the identity to the
/// never-seen state. Failures surface as ordinary [`ThrottleError`]s from
/// [`reset`](ResetHandle::reset).
pub struct ResetHandle<'a, S> {
    engine: &'a ThrottleEngine<S>,
    identity: Identity,
}

impl<'a, S: AttemptStore> ResetHandle<'a, S> {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Drop the identity's record unconditionally.
    pub async fn reset(&self) -> Result<(), ThrottleError> {
        self.engine.reset(&self.identity).await
    }
}

impl<S: AttemptStore> ThrottleEngine<S> {
    /// Run `action` behind a throttle check on `identity`.
    ///
    /// The check serves any owed wait first. A rejection yields
    /// [`GuardOutcome::Rejected`] without invoking the action. A panic inside
    /// the action is caught and returned as [`ThrottleError::Action`].
    ///
    /// # Example
    ///
    /// ```
    /// use bruteguard::{GuardOutcome, Identity, MemoryStore, ThrottleConfig, ThrottleEngine};
    /// use bruteguard::ThrottleOverrides;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = ThrottleEngine::new(MemoryStore::new(), ThrottleConfig::default()).unwrap();
    /// let identity = Identity::custom("username", "alice").unwrap();
    ///
    /// let outcome = engine
    ///     .guard(&identity, &ThrottleOverrides::default(), |reset| async move {
    ///         // ...verify credentials here...
    ///         reset.reset().await?;
    ///         Ok::<_, bruteguard::ThrottleError>("welcome")
    ///     })
    ///     .await
    ///     .unwrap();
    /// assert!(!outcome.is_rejected());
    /// # });
    /// ```
    pub async fn guard<'a, F, Fut, T>(
        &'a self,
        identity: &Identity,
        overrides: &ThrottleOverrides,
        action: F,
    ) -> Result<GuardOutcome<T>, ThrottleError>
    where
        F: FnOnce(ResetHandle<'a, S>) -> Fut,
        Fut: Future<Output = T>,
    {
        let decision = self.check_with(identity, overrides).await?;
        if let Decision::Reject { retry_after } = decision {
            return Ok(GuardOutcome::Rejected { retry_after });
        }

        let handle = ResetHandle {
            engine: self,
            identity: identity.clone(),
        };
        match AssertUnwindSafe(action(handle)).catch_unwind().await {
            Ok(value) => Ok(GuardOutcome::Completed(value)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(identity = %identity, message, "guarded action panicked");
                Err(ThrottleError::Action(message.to_string()))
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "panic with non-string payload"
    }
}
