//! Error types for pool operations.

/// Errors that can occur while drawing, issuing, or resolving identities.
///
/// Every variant is detected before any pool state is mutated, so a failed
/// call never leaves a partial update behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShuffleError {
    /// No undrawn slots remain. The pool is in its terminal state and no
    /// retry will change the outcome.
    #[error("sold out")]
    PoolExhausted,

    /// The batch start is not aligned to the batch size.
    #[error("sequence {seq} is not aligned to a batch start")]
    MisalignedBatch {
        /// The rejected sequence number.
        seq: u64,
    },

    /// An offset has already been recorded for this batch.
    #[error("batch starting at {batch_start} was already issued")]
    BatchAlreadyIssued {
        /// First sequence number of the batch.
        batch_start: u64,
    },

    /// No offset has been recorded for this batch yet.
    #[error("no offset recorded for batch starting at {batch_start}")]
    OffsetNotSet {
        /// First sequence number of the batch.
        batch_start: u64,
    },

    /// The sequence number lies below `start_id` and outside the reserved range.
    #[error("sequence {seq} is outside the issued range")]
    SequenceOutOfRange {
        /// The rejected sequence number.
        seq: u64,
    },

    /// A manually recorded offset is not a value the pool could have drawn.
    #[error("offset {offset} is out of range for a pool of {pool_size}")]
    OffsetOutOfRange {
        /// The rejected offset.
        offset: u64,
        /// Size of the pool.
        pool_size: u64,
    },

    /// The reserved range offset can only be set once.
    #[error("reserved range offset already set")]
    ReserveOffsetAlreadySet,

    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl ShuffleError {
    /// Returns `true` if the error means "no more supply" rather than an
    /// invalid call.
    #[inline]
    pub fn is_sold_out(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

/// Result type for pool operations.
pub type ShuffleResult<T> = Result<T, ShuffleError>;
