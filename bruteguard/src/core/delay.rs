//! Mandatory-wait curve computation and memoization
//!
//! The curve is the ordered sequence of delays an identity must serve, indexed
//! by how many attempts it has already made. Growth is Fibonacci-like: each
//! delay is the sum of the two before it (seeded by `initial_wait`), capped
//! elementwise at `max_wait`. With `initial_wait = 100ms` the sequence runs
//! 100, 200, 300, 500, 800, …

use super::config::ThrottleConfig;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

/// Compute the delay curve for one parameter set.
///
/// Pure function of its three inputs. The accumulator grows by the previous
/// *capped* delay, so once the cap is reached the curve stays flat at
/// `max_wait`.
///
/// # Example
///
/// ```
/// use bruteguard::compute_delay_curve;
/// use std::time::Duration;
///
/// let curve = compute_delay_curve(Duration::from_millis(100), 5, Duration::from_secs(15));
/// let millis: Vec<u128> = curve.iter().map(|d| d.as_millis()).collect();
/// assert_eq!(millis, [100, 200, 300, 500, 800]);
/// ```
pub fn compute_delay_curve(
    initial_wait: Duration,
    allowed_retries: u32,
    max_wait: Duration,
) -> Vec<Duration> {
    let mut curve = Vec::with_capacity(allowed_retries as usize);
    let mut step = initial_wait;
    let mut acc = initial_wait;
    for _ in 0..allowed_retries {
        let capped = acc.min(max_wait);
        curve.push(capped);
        acc = acc.checked_add(step).unwrap_or(Duration::MAX);
        step = capped;
    }
    curve
}

type CurveKey = (u64, u32, u64);

/// Memo table of computed curves, keyed by the full parameter tuple.
///
/// A curve is computed at most once per distinct
/// `(initial_wait, allowed_retries, max_wait)` and never mutated afterwards;
/// the shared slices are safe for unsynchronized concurrent reads.
#[derive(Default)]
pub(crate) struct DelayCurves {
    cache: Mutex<HashMap<CurveKey, Arc<[Duration]>>>,
}

impl DelayCurves {
    pub(crate) fn new() -> Self {
        DelayCurves::default()
    }

    /// Fetch the curve for `config`, computing and caching it on first use.
    pub(crate) fn get(&self, config: &ThrottleConfig) -> Arc<[Duration]> {
        let key = (
            config.initial_wait.as_millis() as u64,
            config.allowed_retries,
            config.max_wait.as_millis() as u64,
        );
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(key)
            .or_insert_with(|| {
                compute_delay_curve(config.initial_wait, config.allowed_retries, config.max_wait)
                    .into()
            })
            .clone()
    }
}
