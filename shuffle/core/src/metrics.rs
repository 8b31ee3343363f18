//! Pool metrics.
//!
//! Counters are process-wide and aggregate over every pool in the process.

use metriken::{Counter, metric};

/// Successful draws.
#[metric(name = "shuffle_draws", description = "Total successful draws")]
pub static DRAWS: Counter = Counter::new();

/// Batches issued.
#[metric(
    name = "shuffle_batches_opened",
    description = "Total batches issued through open_batch"
)]
pub static BATCHES_OPENED: Counter = Counter::new();

/// Draws rejected with `PoolExhausted`.
#[metric(
    name = "shuffle_pool_exhausted",
    description = "Total draws rejected because the pool was sold out"
)]
pub static POOL_EXHAUSTED: Counter = Counter::new();

/// Opens rejected by validation.
#[metric(
    name = "shuffle_rejected_requests",
    description = "Total requests rejected by validation (misaligned, already issued)"
)]
pub static REJECTED_REQUESTS: Counter = Counter::new();
