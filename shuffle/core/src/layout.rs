//! Batch layout and identity mapping.
//!
//! Sequence numbers from `start_id` upward are grouped into batches of
//! `batch_size`. Each batch shares one drawn offset, which selects a block
//! of `batch_size` consecutive identities:
//!
//! ```text
//!   identity(seq) = origin + ((seq - batch_start(seq)) + offset * batch_size) mod space
//! ```

use crate::config::PoolConfig;
use crate::error::{ShuffleError, ShuffleResult};

/// Pure mapping from sequence numbers to batches and identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLayout {
    batch_size: u64,
    start_id: u64,
    identity_space: u64,
    identity_origin: u64,
}

impl BatchLayout {
    /// Build a layout from a validated config.
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            start_id: config.start_id,
            identity_space: config.identity_space,
            identity_origin: config.identity_origin,
        }
    }

    /// Identities per batch.
    #[inline]
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// First sequence number covered by the layout.
    #[inline]
    pub fn start_id(&self) -> u64 {
        self.start_id
    }

    /// Size of the identity space.
    #[inline]
    pub fn identity_space(&self) -> u64 {
        self.identity_space
    }

    /// Value added to every identity.
    #[inline]
    pub fn identity_origin(&self) -> u64 {
        self.identity_origin
    }

    /// Returns `true` if `seq` is the first member of a batch.
    #[inline]
    pub fn is_aligned(&self, seq: u64) -> bool {
        seq >= self.start_id && (seq - self.start_id) % self.batch_size == 0
    }

    /// First sequence number of the batch containing `seq`.
    pub fn batch_start(&self, seq: u64) -> ShuffleResult<u64> {
        if seq < self.start_id {
            return Err(ShuffleError::SequenceOutOfRange { seq });
        }
        Ok(seq - (seq - self.start_id) % self.batch_size)
    }

    /// Batch number of `seq`, counting from zero at `start_id`.
    pub fn batch_index(&self, seq: u64) -> ShuffleResult<u64> {
        if seq < self.start_id {
            return Err(ShuffleError::SequenceOutOfRange { seq });
        }
        Ok((seq - self.start_id) / self.batch_size)
    }

    /// First sequence number of batch `index`, if it is representable.
    pub fn batch_start_of(&self, index: u64) -> Option<u64> {
        index
            .checked_mul(self.batch_size)
            .and_then(|delta| self.start_id.checked_add(delta))
    }

    /// Last sequence number of the batch starting at `batch_start`.
    ///
    /// Fails when the batch would run past `u64::MAX`.
    pub fn batch_end(&self, batch_start: u64) -> ShuffleResult<u64> {
        batch_start
            .checked_add(self.batch_size - 1)
            .ok_or(ShuffleError::SequenceOutOfRange { seq: batch_start })
    }

    /// Identity of `seq` given the offset recorded for its batch.
    pub fn identity(&self, seq: u64, offset: u64) -> ShuffleResult<u64> {
        let batch_start = self.batch_start(seq)?;
        let position = (seq - batch_start) as u128;
        let block = (offset as u128) * (self.batch_size as u128);
        let wrapped = ((position + block) % self.identity_space as u128) as u64;
        Ok(self.identity_origin + wrapped)
    }

    /// Identities of every member of the batch starting at `batch_start`.
    pub fn batch_identities(&self, batch_start: u64, offset: u64) -> ShuffleResult<Vec<u64>> {
        if !self.is_aligned(batch_start) {
            return Err(ShuffleError::MisalignedBatch { seq: batch_start });
        }
        let batch_end = self.batch_end(batch_start)?;
        (batch_start..=batch_end)
            .map(|seq| self.identity(seq, offset))
            .collect()
    }
}
