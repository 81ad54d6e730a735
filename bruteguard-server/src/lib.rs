//! # Bruteguard Server
//!
//! A standalone brute-force throttling service over HTTP/JSON.
//!
//! ## Purpose
//!
//! The server wraps the [`bruteguard`] engine for callers that cannot embed
//! it in-process. An auth service posts to `/check` before verifying
//! credentials — the response arrives after any mandatory delay has been
//! served, or as a 429 once the identity is locked out — and posts to
//! `/reset` after a successful verification to clear the counter.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! bruteguard --help
//!
//! # Defaults: 5 retries, 100ms initial wait, 6 minute window
//! bruteguard --port 8080
//!
//! # Tighter policy behind one trusted proxy
//! bruteguard --allowed-retries 3 --proxy-count 1
//!
//! # Throttle every request before it reaches a handler
//! bruteguard --pre-response
//! ```
//!
//! Configuration comes from CLI arguments or `BRUTEGUARD_*` environment
//! variables (CLI takes precedence); see `--list-env-vars`.
//!
//! ## Identity
//!
//! By default attempts are keyed by the client address, resolved through
//! `X-Forwarded-For` up to the configured trusted proxy depth. A request
//! body naming `key` and `value` (e.g. `"username"`/`"alice"`) keys the
//! attempt by that pair instead, so a distributed attack on one account is
//! throttled as one identity.
//!
//! ## Example
//!
//! ```bash
//! curl -X POST http://localhost:8080/check \
//!   -H "Content-Type: application/json" \
//!   -d '{"key": "username", "value": "alice", "config": {"allowed_retries": 3}}'
//! ```

pub mod config;
pub mod metrics;
pub mod transport;
pub mod types;
