//! Reserved range resolved by a single one-time offset.
//!
//! Tokens minted outside the batch flow (e.g. an owner's reserve minted
//! before the first pack is opened) occupy the sequence numbers
//! `[first, first + count)`. Once all of them exist, one seed is reduced to
//! an offset that rotates the whole range:
//!
//! ```text
//!   identity(seq) = first + ((seq - first) + offset) mod count
//! ```

use crate::error::{ShuffleError, ShuffleResult};

/// A contiguous range of sequence numbers sharing one rotation offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedRange {
    first: u64,
    count: u64,
    offset: Option<u64>,
}

impl ReservedRange {
    /// Create a range covering `[first, first + count)` with no offset set.
    pub fn new(first: u64, count: u64) -> ShuffleResult<Self> {
        if count == 0 {
            return Err(ShuffleError::InvalidConfig("reserved count must be > 0"));
        }
        if first.checked_add(count).is_none() {
            return Err(ShuffleError::InvalidConfig("reserved range overflows"));
        }
        Ok(Self {
            first,
            count,
            offset: None,
        })
    }

    /// First sequence number in the range.
    #[inline]
    pub fn first(&self) -> u64 {
        self.first
    }

    /// Number of sequence numbers in the range.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// One past the last sequence number in the range.
    #[inline]
    pub fn end(&self) -> u64 {
        self.first + self.count
    }

    /// The recorded offset, if any.
    #[inline]
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns `true` if `seq` lies in the range.
    #[inline]
    pub fn contains(&self, seq: u64) -> bool {
        seq >= self.first && seq < self.end()
    }

    /// Reduce `seed` to the range offset. Can only succeed once.
    pub fn set_offset(&mut self, seed: u64) -> ShuffleResult<u64> {
        if self.offset.is_some() {
            return Err(ShuffleError::ReserveOffsetAlreadySet);
        }
        let offset = seed % self.count;
        self.offset = Some(offset);
        tracing::info!(
            first = self.first,
            count = self.count,
            offset,
            "reserved range offset set"
        );
        Ok(offset)
    }

    /// Identity of `seq` within the range.
    pub fn identity(&self, seq: u64) -> ShuffleResult<u64> {
        if !self.contains(seq) {
            return Err(ShuffleError::SequenceOutOfRange { seq });
        }
        let offset = self.offset.ok_or(ShuffleError::OffsetNotSet {
            batch_start: self.first,
        })?;
        let position = ((seq - self.first) as u128 + offset as u128) % self.count as u128;
        Ok(self.first + position as u64)
    }
}
