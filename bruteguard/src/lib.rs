//! # Bruteguard
//!
//! Brute-force attempt throttling for Rust: exponentially growing mandatory
//! delays and sliding-window lockout, keyed by caller identity.
//!
//! ## Overview
//!
//! Bruteguard throttles repeated attempts against an endpoint (login,
//! password reset, token guessing) per identity:
//!
//! - **First observation is free**: a fresh identity is always allowed with
//!   zero delay
//! - **Delays grow Fibonacci-like**: 100ms, 200ms, 300ms, 500ms, 800ms, …,
//!   capped at a configurable maximum
//! - **Lockout past the ceiling**: once the retry ceiling is exceeded within
//!   the window, attempts are rejected with a retry-after duration
//! - **Sliding window**: every attempt refreshes the store TTL; an identity
//!   is forgotten only after a full window of inactivity
//!
//! ## Quick Start
//!
//! ```
//! use bruteguard::{Decision, Identity, MemoryStore, ThrottleConfig, ThrottleEngine};
//!
//! # tokio_test::block_on(async {
//! let engine = ThrottleEngine::new(MemoryStore::new(), ThrottleConfig::default()).unwrap();
//!
//! // Identity from request context: forwarded header, remote address,
//! // trusted proxy depth
//! let identity = Identity::from_request(Some("203.0.113.7, 10.0.0.2"), "10.0.0.1", 1);
//!
//! match engine.check(&identity).await.unwrap() {
//!     Decision::Allow => println!("proceed"),
//!     Decision::AllowAfter(wait) => println!("proceeded after {wait:?}"),
//!     Decision::Reject { retry_after } => println!("locked out, retry in {retry_after:?}"),
//! }
//! # });
//! ```
//!
//! ## Custom identities
//!
//! Attempts are keyed by the caller's address by default. For endpoints where
//! the sensitive resource is a named account, key by an explicit pair:
//!
//! ```
//! use bruteguard::Identity;
//!
//! let identity = Identity::custom("username", "alice").unwrap();
//! assert_eq!(identity.storage_key(), "username-alice");
//! ```
//!
//! ## Guarded actions
//!
//! The usual login shape — check, verify, clear the counter on success — is
//! packaged as a guarded action with an explicit reset handle:
//!
//! ```
//! use bruteguard::{GuardOutcome, Identity, MemoryStore, ThrottleConfig, ThrottleEngine};
//! use bruteguard::ThrottleOverrides;
//!
//! # tokio_test::block_on(async {
//! let engine = ThrottleEngine::new(MemoryStore::new(), ThrottleConfig::default()).unwrap();
//! let identity = Identity::custom("username", "alice").unwrap();
//!
//! let outcome = engine
//!     .guard(&identity, &ThrottleOverrides::default(), |reset| async move {
//!         // verify the credentials...
//!         reset.reset().await?;
//!         Ok::<_, bruteguard::ThrottleError>(())
//!     })
//!     .await
//!     .unwrap();
//!
//! match outcome {
//!     GuardOutcome::Completed(result) => result.unwrap(),
//!     GuardOutcome::Rejected { retry_after } => {
//!         println!("too many attempts, retry in {retry_after:?}")
//!     }
//! }
//! # });
//! ```
//!
//! ## Stores
//!
//! The engine is generic over an [`AttemptStore`] — get/set/remove with TTL
//! semantics. [`MemoryStore`] is the bundled single-process implementation;
//! point the trait at your cache of choice for anything shared.
//!
//! ```
//! use bruteguard::MemoryStore;
//! use std::time::Duration;
//!
//! let store = MemoryStore::builder()
//!     .capacity(100_000)
//!     .window(Duration::from_secs(360))
//!     .cleanup_interval(Duration::from_secs(60))
//!     .build();
//! ```
//!
//! ## Concurrency
//!
//! Owed delays are served with `tokio::time::sleep` — a suspension of the
//! calling task only, never a blocked thread. Each check is one read and one
//! write against the store with no engine-level lock between them; concurrent
//! checks on one identity race benignly, bounded by whatever atomicity the
//! store provides. Delay curves and merged configurations are immutable once
//! computed and safe to read from any number of tasks.
//!
//! ## Features
//!
//! - `ahash` (default): use AHash for the curve memo table and memory store

pub mod core;

pub use core::{
    AttemptRecord, AttemptStore, CachedRecord, Decision, GuardOutcome, Identity, MemoryStore,
    MemoryStoreBuilder, ResetHandle, StoreError, ThrottleConfig, ThrottleEngine, ThrottleError,
    ThrottleOverrides, compute_delay_curve,
};
