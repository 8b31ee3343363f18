//! Batch issuer: draw-and-assign for each opened batch.
//!
//! The issuer owns the draw engine and the permanent offset record. Each
//! successful [`BatchIssuer::open_batch`] consumes exactly one draw and
//! stores it under the batch's first sequence number. Identities are never
//! stored; they are recomputed from the record on every query.

use std::collections::BTreeMap;

use crate::config::PoolConfig;
use crate::engine::{DrawEngine, PoolState};
use crate::error::{ShuffleError, ShuffleResult};
use crate::layout::BatchLayout;
use crate::metrics::{BATCHES_OPENED, REJECTED_REQUESTS};
use crate::reserve::ReservedRange;

/// Point-in-time view of an issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of draw values.
    pub pool_size: u64,
    /// Values not yet drawn.
    pub available: u64,
    /// Batches with a recorded offset.
    pub batches_issued: u64,
    /// Sequence numbers covered by issued batches.
    pub tokens_issued: u64,
    /// Lifecycle state of the draw engine.
    pub state: PoolState,
}

/// Allocator for one identity space.
#[derive(Debug, Clone)]
pub struct BatchIssuer {
    config: PoolConfig,
    layout: BatchLayout,
    engine: DrawEngine,
    /// Offsets keyed by batch start. Written once, never overwritten.
    offsets: BTreeMap<u64, u64>,
    reserved: Option<ReservedRange>,
}

impl BatchIssuer {
    /// Create an issuer with a fresh pool.
    pub fn new(config: PoolConfig) -> ShuffleResult<Self> {
        config.validate()?;

        if config.may_wrap() {
            tracing::warn!(
                pool_size = config.pool_size,
                batch_size = config.batch_size,
                identity_space = config.identity_space,
                "pool blocks exceed the identity space, identities from different batches may overlap"
            );
        }

        Ok(Self {
            config,
            layout: BatchLayout::new(&config),
            engine: DrawEngine::new(config.pool_size),
            offsets: BTreeMap::new(),
            reserved: None,
        })
    }

    /// Attach a reserved range `[first, first + count)` below `start_id`.
    pub fn with_reserved(mut self, first: u64, count: u64) -> ShuffleResult<Self> {
        let range = ReservedRange::new(first, count)?;
        if range.end() > self.config.start_id {
            return Err(ShuffleError::InvalidConfig(
                "reserved range must end at or before start_id",
            ));
        }
        self.reserved = Some(range);
        Ok(self)
    }

    /// Construction parameters.
    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Sequence-to-identity mapping.
    #[inline]
    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    /// Read-only view of the draw engine.
    #[inline]
    pub fn engine(&self) -> &DrawEngine {
        &self.engine
    }

    /// The reserved range, if configured.
    #[inline]
    pub fn reserved(&self) -> Option<&ReservedRange> {
        self.reserved.as_ref()
    }

    /// Values not yet drawn.
    #[inline]
    pub fn available(&self) -> u64 {
        self.engine.available()
    }

    /// Lifecycle state.
    #[inline]
    pub fn state(&self) -> PoolState {
        self.engine.state()
    }

    /// Returns `true` once the pool is sold out.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.engine.is_exhausted()
    }

    /// Returns `true` if the batch starting at `batch_start` has an offset.
    #[inline]
    pub fn is_issued(&self, batch_start: u64) -> bool {
        self.offsets.contains_key(&batch_start)
    }

    /// Issued batches as `(batch_start, offset)`, in sequence order.
    pub fn issued(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.offsets.iter().map(|(&start, &offset)| (start, offset))
    }

    /// Snapshot of the issuer's counters.
    pub fn stats(&self) -> PoolStats {
        let batches_issued = self.offsets.len() as u64;
        PoolStats {
            pool_size: self.engine.pool_size(),
            available: self.engine.available(),
            batches_issued,
            tokens_issued: batches_issued * self.config.batch_size,
            state: self.engine.state(),
        }
    }

    /// Check that a batch may be assigned an offset.
    fn check_unissued(&self, batch_start: u64) -> ShuffleResult<()> {
        if !self.layout.is_aligned(batch_start) {
            REJECTED_REQUESTS.increment();
            return Err(ShuffleError::MisalignedBatch { seq: batch_start });
        }
        if let Err(e) = self.layout.batch_end(batch_start) {
            REJECTED_REQUESTS.increment();
            return Err(e);
        }
        if self.offsets.contains_key(&batch_start) {
            REJECTED_REQUESTS.increment();
            return Err(ShuffleError::BatchAlreadyIssued { batch_start });
        }
        Ok(())
    }

    /// Draw an offset for the batch starting at `batch_start` and return the
    /// identities of its members.
    ///
    /// All validation happens before the draw. On error the pool and the
    /// offset record are unchanged.
    pub fn open_batch(&mut self, batch_start: u64, seed: u64) -> ShuffleResult<Vec<u64>> {
        self.check_unissued(batch_start)?;

        let offset = self.engine.draw(seed)?;
        self.offsets.insert(batch_start, offset);
        BATCHES_OPENED.increment();

        tracing::debug!(
            batch_start,
            offset,
            available = self.engine.available(),
            "batch opened"
        );

        if self.engine.is_exhausted() {
            tracing::info!(
                pool_size = self.engine.pool_size(),
                batches = self.offsets.len(),
                "pool sold out"
            );
        }

        self.layout.batch_identities(batch_start, offset)
    }

    /// Record a known offset for a batch without drawing.
    ///
    /// Used to replay a record produced elsewhere. The offset is not removed
    /// from the draw engine, so mixing this with [`open_batch`] on the same
    /// issuer can hand the same offset out twice.
    ///
    /// [`open_batch`]: Self::open_batch
    pub fn record_offset(&mut self, batch_start: u64, offset: u64) -> ShuffleResult<()> {
        if offset >= self.config.pool_size {
            REJECTED_REQUESTS.increment();
            return Err(ShuffleError::OffsetOutOfRange {
                offset,
                pool_size: self.config.pool_size,
            });
        }
        self.check_unissued(batch_start)?;
        self.offsets.insert(batch_start, offset);
        Ok(())
    }

    /// The offset recorded for the batch containing `seq`.
    pub fn offset_for(&self, seq: u64) -> ShuffleResult<u64> {
        let batch_start = self.layout.batch_start(seq)?;
        self.offsets
            .get(&batch_start)
            .copied()
            .ok_or(ShuffleError::OffsetNotSet { batch_start })
    }

    /// Final identity of `seq`.
    ///
    /// Sequence numbers below `start_id` resolve through the reserved range.
    pub fn identity(&self, seq: u64) -> ShuffleResult<u64> {
        if seq < self.config.start_id {
            return match &self.reserved {
                Some(range) => range.identity(seq),
                None => Err(ShuffleError::SequenceOutOfRange { seq }),
            };
        }
        let offset = self.offset_for(seq)?;
        self.layout.identity(seq, offset)
    }

    /// Identities of every member of an issued batch.
    pub fn batch_identities(&self, batch_start: u64) -> ShuffleResult<Vec<u64>> {
        if !self.layout.is_aligned(batch_start) {
            return Err(ShuffleError::MisalignedBatch { seq: batch_start });
        }
        let offset = self.offset_for(batch_start)?;
        self.layout.batch_identities(batch_start, offset)
    }

    /// Set the one-time offset of the reserved range.
    pub fn set_reserved_offset(&mut self, seed: u64) -> ShuffleResult<u64> {
        match &mut self.reserved {
            Some(range) => range.set_offset(seed),
            None => Err(ShuffleError::InvalidConfig("no reserved range configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> BatchIssuer {
        BatchIssuer::new(PoolConfig::new(20, 4)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(BatchIssuer::new(PoolConfig::new(0, 4)).is_err());
    }

    #[test]
    fn test_open_batch_returns_block() {
        let mut issuer = tester();
        let ids = issuer.open_batch(0, 5).unwrap();
        let offset = issuer.offset_for(0).unwrap();

        assert_eq!(offset, 5);
        assert_eq!(ids, vec![20, 21, 22, 23]);
        assert_eq!(issuer.available(), 19);
        assert!(issuer.is_issued(0));
    }

    #[test]
    fn test_open_batch_rejects_misaligned() {
        let mut issuer = tester();
        assert_eq!(
            issuer.open_batch(2, 0),
            Err(ShuffleError::MisalignedBatch { seq: 2 })
        );
        assert_eq!(issuer.available(), 20);
    }

    #[test]
    fn test_open_batch_is_idempotent() {
        let mut issuer = tester();
        issuer.open_batch(4, 7).unwrap();
        assert_eq!(
            issuer.open_batch(4, 8),
            Err(ShuffleError::BatchAlreadyIssued { batch_start: 4 })
        );
        assert_eq!(issuer.offset_for(4), Ok(7));
        assert_eq!(issuer.available(), 19);
    }

    #[test]
    fn test_open_batch_sold_out() {
        let mut issuer = tester();
        for batch in 0..20 {
            issuer.open_batch(batch * 4, batch).unwrap();
        }
        assert_eq!(issuer.state(), PoolState::Exhausted);
        assert_eq!(issuer.open_batch(80, 0), Err(ShuffleError::PoolExhausted));
        assert!(!issuer.is_issued(80));
        assert_eq!(issuer.stats().batches_issued, 20);
    }

    #[test]
    fn test_offset_zero_is_not_unset() {
        let mut issuer = tester();
        issuer.record_offset(0, 0).unwrap();
        assert_eq!(issuer.offset_for(0), Ok(0));
        assert_eq!(issuer.identity(3), Ok(3));
        assert_eq!(
            issuer.record_offset(0, 1),
            Err(ShuffleError::BatchAlreadyIssued { batch_start: 0 })
        );
    }

    #[test]
    fn test_identity_requires_offset() {
        let issuer = tester();
        assert_eq!(
            issuer.identity(6),
            Err(ShuffleError::OffsetNotSet { batch_start: 4 })
        );
    }

    #[test]
    fn test_record_offset_validation() {
        let mut issuer = tester();
        assert_eq!(
            issuer.record_offset(0, 20),
            Err(ShuffleError::OffsetOutOfRange {
                offset: 20,
                pool_size: 20
            })
        );
        assert_eq!(
            issuer.record_offset(1, 3),
            Err(ShuffleError::MisalignedBatch { seq: 1 })
        );
        assert_eq!(issuer.available(), 20);
    }

    #[test]
    fn test_reserved_range_dispatch() {
        let config = PoolConfig::new(250, 4).with_start_id(1000);
        let mut issuer = BatchIssuer::new(config)
            .unwrap()
            .with_reserved(1, 999)
            .unwrap();

        assert_eq!(
            issuer.identity(5),
            Err(ShuffleError::OffsetNotSet { batch_start: 1 })
        );
        assert_eq!(issuer.set_reserved_offset(2), Ok(2));
        assert_eq!(issuer.identity(1), Ok(3));
        assert_eq!(issuer.identity(999), Ok(2));
        assert_eq!(
            issuer.set_reserved_offset(4),
            Err(ShuffleError::ReserveOffsetAlreadySet)
        );
    }

    #[test]
    fn test_sequence_below_start_without_reserve() {
        let issuer = BatchIssuer::new(PoolConfig::new(20, 4).with_start_id(100)).unwrap();
        assert_eq!(
            issuer.identity(50),
            Err(ShuffleError::SequenceOutOfRange { seq: 50 })
        );
    }

    #[test]
    fn test_reserved_range_must_precede_start() {
        let issuer = BatchIssuer::new(PoolConfig::new(20, 4).with_start_id(100)).unwrap();
        assert!(issuer.with_reserved(90, 20).is_err());
    }

    #[test]
    fn test_stats() {
        let mut issuer = tester();
        issuer.open_batch(0, 1).unwrap();
        issuer.open_batch(4, 1).unwrap();

        let stats = issuer.stats();
        assert_eq!(stats.pool_size, 20);
        assert_eq!(stats.available, 18);
        assert_eq!(stats.batches_issued, 2);
        assert_eq!(stats.tokens_issued, 8);
        assert_eq!(stats.state, PoolState::Active);
        assert_eq!(issuer.issued().collect::<Vec<_>>(), vec![(0, 1), (4, 19)]);
    }
}
