//! Retry utilities: backoff builders for contended order transactions.
//!
//! Uses `backon` for exponential backoff with jitter.

use backon::ExponentialBuilder;

use crate::config::OrderPolicy;

/// Backoff for order transactions that lost a lock race.
///
/// Delays grow from `retry_min_delay_ms` to `retry_max_delay_ms`, with
/// jitter so competing checkouts do not retry in lockstep. `max_retries`
/// counts retries after the first attempt.
pub fn order_backoff(policy: &OrderPolicy) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(policy.retry_min_delay())
        .with_max_delay(policy.retry_max_delay())
        .with_max_times(policy.max_retries)
        .with_jitter()
}
