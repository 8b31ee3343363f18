//! Batched token minting on top of the shuffle allocator.
//!
//! Loads a pool from a TOML file, opens batches from one or more worker
//! threads, and reports the identities and metadata URIs handed out.

pub mod banner;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod signal;
pub mod simulate;
