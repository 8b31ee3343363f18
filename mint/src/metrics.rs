//! Simulation metrics.

use metriken::{Gauge, metric};
use shuffle_core::PoolStats;

#[metric(
    name = "mint_pool_available",
    description = "Offsets still available in the pool"
)]
pub static POOL_AVAILABLE: Gauge = Gauge::new();

#[metric(
    name = "mint_batches_issued",
    description = "Batches issued in the pool"
)]
pub static BATCHES_ISSUED: Gauge = Gauge::new();

#[metric(
    name = "mint_tokens_issued",
    description = "Tokens issued through batches"
)]
pub static TOKENS_ISSUED: Gauge = Gauge::new();

/// Publish a pool snapshot to the gauges.
pub fn record_stats(stats: &PoolStats) {
    POOL_AVAILABLE.set(stats.available as i64);
    BATCHES_ISSUED.set(stats.batches_issued as i64);
    TOKENS_ISSUED.set(stats.tokens_issued as i64);
}
