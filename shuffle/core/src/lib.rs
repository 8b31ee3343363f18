//! shuffle-core: sparse shuffle allocator for batched token identities.
//!
//! Tokens are minted in fixed-size batches. Each batch receives one offset
//! drawn without replacement from `[0, pool_size)`, and every member's final
//! identity is a pure function of that offset and its position in the batch.
//!
//! - **Engine**: `DrawEngine`, a lazy Fisher-Yates over a sparse map
//! - **Layout**: `BatchLayout`, batch alignment and the identity formula
//! - **Issuer**: `BatchIssuer`, one draw per opened batch plus the offset record
//! - **Reserve**: `ReservedRange`, a one-time rotation for tokens minted before `start_id`
//! - **Shared**: `SharedIssuer`, mutex-guarded single-writer access with a batch cursor
//! - **URI**: `TokenUri`, identity to metadata URI with a hidden fallback
//!
//! # Architecture
//!
//! ```text
//!   open request (batch_start, seed)
//!              |
//!              v
//!   +---------------------+   draw(seed)   +----------------+
//!   |     BatchIssuer     | -------------> |   DrawEngine   |
//!   | offsets[batch_start]| <------------- | sparse cells   |
//!   +---------------------+     offset     +----------------+
//!              |
//!              v
//!   +---------------------+
//!   |     BatchLayout     |  identity(seq) = f(offset, seq - batch_start)
//!   +---------------------+
//! ```
//!
//! # Example
//!
//! ```
//! use shuffle_core::{BatchIssuer, PoolConfig};
//!
//! let config = PoolConfig::new(5000, 4).with_start_id(1000);
//! let mut issuer = BatchIssuer::new(config).unwrap();
//!
//! let identities = issuer.open_batch(1000, 0xdead_beef).unwrap();
//! assert_eq!(identities.len(), 4);
//! assert_eq!(issuer.identity(1002).unwrap(), identities[2]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod engine;
mod error;
mod issuer;
mod layout;
mod reserve;
mod shared;
mod uri;

pub mod metrics;

pub use config::PoolConfig;
pub use engine::{DrawEngine, PoolState};
pub use error::{ShuffleError, ShuffleResult};
pub use issuer::{BatchIssuer, PoolStats};
pub use layout::BatchLayout;
pub use reserve::ReservedRange;
pub use shared::{OpenedBatch, SharedIssuer};
pub use uri::TokenUri;
