//! Sparse lazy Fisher-Yates draw engine.
//!
//! The engine behaves as if the array `V = [0, 1, .., pool_size)` had been
//! shuffled once and is then popped one value at a time, but never allocates
//! `V`. Only positions whose value differs from their index are stored, so
//! memory grows with the number of draws, not with the pool size.
//!
//! ```text
//!   available = 6, seed % 6 = 2
//!
//!   V:  [0] [1] [2] [3] [4] [5]        returns V[2] = 2
//!                ^           |
//!                +-----------+         V[2] := V[5]
//!
//!   V:  [0] [1] [5] [3] [4] | popped   cells = {2 -> 5}
//! ```

use ahash::AHashMap;

use crate::error::{ShuffleError, ShuffleResult};
use crate::metrics::{DRAWS, POOL_EXHAUSTED};

/// Lifecycle of a pool. Transitions only from `Active` to `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// At least one value remains undrawn.
    Active,
    /// Every value has been drawn. Terminal.
    Exhausted,
}

/// Draw engine over the virtual array `[0, pool_size)`.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    /// Total number of values ever obtainable.
    pool_size: u64,
    /// Remaining undrawn values. The live region of `V` is `[0, available)`.
    available: u64,
    /// Relocated values. A missing key `i` means `V[i] == i`.
    cells: AHashMap<u64, u64>,
}

impl DrawEngine {
    /// Create an engine with every value in `[0, pool_size)` available.
    pub fn new(pool_size: u64) -> Self {
        Self {
            pool_size,
            available: pool_size,
            cells: AHashMap::new(),
        }
    }

    /// Total number of values this engine can ever return.
    #[inline]
    pub fn pool_size(&self) -> u64 {
        self.pool_size
    }

    /// Number of values not yet drawn.
    #[inline]
    pub fn available(&self) -> u64 {
        self.available
    }

    /// Number of successful draws so far.
    #[inline]
    pub fn drawn(&self) -> u64 {
        self.pool_size - self.available
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> PoolState {
        if self.available == 0 {
            PoolState::Exhausted
        } else {
            PoolState::Active
        }
    }

    /// Returns `true` once every value has been drawn.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }

    /// Number of positions currently holding a relocated value.
    #[inline]
    pub fn relocated(&self) -> usize {
        self.cells.len()
    }

    /// Read `V[index]` from the live region.
    ///
    /// Returns `None` for indices that have already been popped.
    pub fn value_at(&self, index: u64) -> Option<u64> {
        if index >= self.available {
            return None;
        }
        Some(self.read(index))
    }

    #[inline]
    fn read(&self, index: u64) -> u64 {
        self.cells.get(&index).copied().unwrap_or(index)
    }

    /// Draw one value that has never been returned before.
    ///
    /// `seed` is reduced modulo the number of remaining values to pick the
    /// swap position. Fails with [`ShuffleError::PoolExhausted`] without
    /// touching any state once the pool is empty.
    pub fn draw(&mut self, seed: u64) -> ShuffleResult<u64> {
        if self.available == 0 {
            POOL_EXHAUSTED.increment();
            return Err(ShuffleError::PoolExhausted);
        }

        let swap_index = seed % self.available;
        let last_index = self.available - 1;

        // Both reads happen before any write.
        let value_at_swap = self.read(swap_index);
        let value_at_last = self.read(last_index);

        // The popped tail position is never read again.
        self.cells.remove(&last_index);

        if swap_index != last_index {
            if value_at_last == swap_index {
                self.cells.remove(&swap_index);
            } else {
                self.cells.insert(swap_index, value_at_last);
            }
        }

        self.available = last_index;
        DRAWS.increment();

        tracing::trace!(
            swap_index,
            value = value_at_swap,
            available = self.available,
            "draw"
        );

        Ok(value_at_swap)
    }
}
