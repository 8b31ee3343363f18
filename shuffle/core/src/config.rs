//! Construction parameters for a pool.

use crate::error::{ShuffleError, ShuffleResult};

/// Fixed parameters of one identity space.
///
/// All fields are immutable once a pool is built from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of distinct draw values, `[0, pool_size)`.
    pub pool_size: u64,

    /// Number of identities produced per draw.
    pub batch_size: u64,

    /// First sequence number handed out through batches.
    pub start_id: u64,

    /// Size of the target identity space. Identities wrap modulo this value.
    pub identity_space: u64,

    /// Added to every shuffled identity after the modular reduction.
    /// Default: 0
    pub identity_origin: u64,
}

impl PoolConfig {
    /// Create a config with `identity_space = pool_size * batch_size`,
    /// so each draw selects one aligned block of `batch_size` identities.
    pub fn new(pool_size: u64, batch_size: u64) -> Self {
        Self {
            pool_size,
            batch_size,
            start_id: 0,
            identity_space: pool_size.saturating_mul(batch_size),
            identity_origin: 0,
        }
    }

    /// Set the first sequence number handed out through batches.
    pub fn with_start_id(mut self, start_id: u64) -> Self {
        self.start_id = start_id;
        self
    }

    /// Set the identity space size.
    pub fn with_identity_space(mut self, identity_space: u64) -> Self {
        self.identity_space = identity_space;
        self
    }

    /// Set the value added to every shuffled identity.
    pub fn with_identity_origin(mut self, identity_origin: u64) -> Self {
        self.identity_origin = identity_origin;
        self
    }

    /// Returns `true` if two different draws can map onto overlapping
    /// identities because the blocks do not fit the identity space.
    pub fn may_wrap(&self) -> bool {
        (self.pool_size as u128) * (self.batch_size as u128) > self.identity_space as u128
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ShuffleResult<()> {
        if self.pool_size == 0 {
            return Err(ShuffleError::InvalidConfig("pool_size must be > 0"));
        }

        if self.batch_size == 0 {
            return Err(ShuffleError::InvalidConfig("batch_size must be > 0"));
        }

        if self.identity_space < self.batch_size {
            return Err(ShuffleError::InvalidConfig(
                "identity_space must hold at least one batch",
            ));
        }

        if self.identity_origin.checked_add(self.identity_space - 1).is_none() {
            return Err(ShuffleError::InvalidConfig(
                "identity_origin + identity_space overflows",
            ));
        }

        // last sequence number a full pool can issue
        let issued = (self.pool_size as u128) * (self.batch_size as u128);
        if (self.start_id as u128) + issued > u64::MAX as u128 + 1 {
            return Err(ShuffleError::InvalidConfig(
                "start_id + pool_size * batch_size overflows",
            ));
        }

        Ok(())
    }
}
