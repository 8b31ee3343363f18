//! Single-writer access to an issuer shared between threads.
//!
//! Draws against one pool are totally ordered: the mutex makes every open
//! one atomic step, and the cursor that picks the next batch start lives
//! under the same lock so callers never race for a batch.

use parking_lot::Mutex;

use crate::error::{ShuffleError, ShuffleResult};
use crate::issuer::{BatchIssuer, PoolStats};

/// A batch handed out by [`SharedIssuer::open_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedBatch {
    /// First sequence number of the batch.
    pub batch_start: u64,
    /// Offset drawn for the batch.
    pub offset: u64,
    /// Identities of the batch members, in sequence order.
    pub identities: Vec<u64>,
}

struct Inner {
    issuer: BatchIssuer,
    /// Next batch start handed out by `open_next`.
    cursor: u64,
}

/// Thread-safe wrapper around a [`BatchIssuer`].
pub struct SharedIssuer {
    inner: Mutex<Inner>,
}

impl SharedIssuer {
    /// Wrap an issuer. The cursor starts at the issuer's `start_id`.
    pub fn new(issuer: BatchIssuer) -> Self {
        let cursor = issuer.config().start_id;
        Self {
            inner: Mutex::new(Inner { issuer, cursor }),
        }
    }

    /// Open the next unissued batch after the cursor.
    ///
    /// Batches already issued through [`open_batch`] are skipped. The cursor
    /// only advances past a batch once it has been issued, so a failed open
    /// leaves it in place. Fails with [`ShuffleError::SequenceOutOfRange`]
    /// once every batch up to `u64::MAX` has been issued.
    ///
    /// [`open_batch`]: Self::open_batch
    pub fn open_next(&self, seed: u64) -> ShuffleResult<OpenedBatch> {
        let mut inner = self.inner.lock();
        let batch_size = inner.issuer.config().batch_size;

        let mut batch_start = inner.cursor;
        while inner.issuer.is_issued(batch_start) {
            batch_start = batch_start
                .checked_add(batch_size)
                .ok_or(ShuffleError::SequenceOutOfRange { seq: batch_start })?;
        }

        let identities = inner.issuer.open_batch(batch_start, seed)?;
        let offset = inner.issuer.offset_for(batch_start)?;

        // The last representable batch stays under the cursor.
        inner.cursor = batch_start.checked_add(batch_size).unwrap_or(batch_start);

        Ok(OpenedBatch {
            batch_start,
            offset,
            identities,
        })
    }

    /// Open a specific batch. See [`BatchIssuer::open_batch`].
    pub fn open_batch(&self, batch_start: u64, seed: u64) -> ShuffleResult<Vec<u64>> {
        self.inner.lock().issuer.open_batch(batch_start, seed)
    }

    /// Identity of `seq`. See [`BatchIssuer::identity`].
    pub fn identity(&self, seq: u64) -> ShuffleResult<u64> {
        self.inner.lock().issuer.identity(seq)
    }

    /// Offset of the batch containing `seq`.
    pub fn offset_for(&self, seq: u64) -> ShuffleResult<u64> {
        self.inner.lock().issuer.offset_for(seq)
    }

    /// Set the one-time reserved range offset.
    pub fn set_reserved_offset(&self, seed: u64) -> ShuffleResult<u64> {
        self.inner.lock().issuer.set_reserved_offset(seed)
    }

    /// Next batch start `open_next` will try.
    pub fn cursor(&self) -> u64 {
        self.inner.lock().cursor
    }

    /// Snapshot of the issuer's counters.
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().issuer.stats()
    }

    /// Run `f` with shared access to the issuer.
    pub fn with<R>(&self, f: impl FnOnce(&BatchIssuer) -> R) -> R {
        f(&self.inner.lock().issuer)
    }

    /// Unwrap the issuer.
    pub fn into_inner(self) -> BatchIssuer {
        self.inner.into_inner().issuer
    }
}
