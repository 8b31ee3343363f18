//! Pack-opening simulation.
//!
//! Drives one pool the way a token contract would: the reserved range gets
//! its one-time offset, then worker threads open batches in sequence order
//! until the requested number of opens is reached or the pool sells out.
//! Every worker draws its seeds from its own `Xoshiro256PlusPlus`, so a
//! single-threaded run is fully reproducible from the configured seed.

use crate::config::{Config, ConfigError};
use crate::metrics;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use shuffle_core::{OpenedBatch, PoolStats, SharedIssuer, ShuffleError};
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Errors that abort a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration could not be turned into an issuer.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The allocator rejected a call for a reason other than selling out.
    #[error("allocator error: {0}")]
    Shuffle(#[from] ShuffleError),
    /// Writing output or spawning a worker failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A worker thread panicked.
    #[error("worker thread panicked")]
    WorkerPanicked,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Seed the run was derived from.
    pub seed: u64,
    /// Offset given to the reserved range, if one is configured.
    pub reserved_offset: Option<u64>,
    /// Batches opened, in sequence order.
    pub batches: Vec<OpenedBatch>,
    /// The pool sold out during the run.
    pub sold_out: bool,
    /// The run was stopped by a signal.
    pub interrupted: bool,
    /// Identities handed out more than once, across reserved and minted tokens.
    pub duplicates: u64,
    /// Pool counters at the end of the run.
    pub stats: PoolStats,
}

impl SimulationReport {
    /// Number of tokens minted through batches.
    pub fn tokens(&self) -> u64 {
        self.batches.iter().map(|b| b.identities.len() as u64).sum()
    }
}

/// Run the simulation described by `config`, writing token lines to `out`
/// when `simulation.print_tokens` is set.
pub fn run<W: Write>(
    config: &Config,
    seed: u64,
    shutdown: &AtomicBool,
    out: &mut W,
) -> Result<SimulationReport, SimulationError> {
    let shared = SharedIssuer::new(config.issuer()?);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let reserved_offset = match config.reserve {
        Some(_) => Some(shared.set_reserved_offset(rng.random())?),
        None => None,
    };

    let threads = config.simulation.threads;
    let remaining = AtomicU64::new(config.simulation.opens.unwrap_or(u64::MAX));
    let sold_out = AtomicBool::new(false);

    tracing::info!(seed, threads, "starting simulation");

    let results = std::thread::scope(|s| -> Result<Vec<_>, SimulationError> {
        let mut handles = Vec::with_capacity(threads);
        for id in 0..threads {
            let worker_seed = rng.random::<u64>();
            let shared = &shared;
            let remaining = &remaining;
            let sold_out = &sold_out;
            let handle = std::thread::Builder::new()
                .name(format!("mint-{id}"))
                .spawn_scoped(s, move || {
                    run_worker(worker_seed, shared, remaining, sold_out, shutdown)
                })?;
            handles.push(handle);
        }

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| SimulationError::WorkerPanicked))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut batches = Vec::new();
    for result in results {
        batches.extend(result?);
    }
    batches.sort_by_key(|b| b.batch_start);

    let reserved = shared.with(|issuer| match issuer.reserved() {
        Some(range) => (range.first()..range.end())
            .map(|seq| range.identity(seq))
            .collect::<Result<Vec<_>, _>>(),
        None => Ok(Vec::new()),
    })?;

    let mut seen = HashSet::new();
    let duplicates = reserved
        .iter()
        .chain(batches.iter().flat_map(|b| b.identities.iter()))
        .filter(|&&id| !seen.insert(id))
        .count() as u64;

    if duplicates > 0 {
        tracing::warn!(duplicates, "identities issued more than once");
    }

    if config.simulation.print_tokens {
        write_tokens(config, &shared, &batches, out)?;
    }

    let report = SimulationReport {
        seed,
        reserved_offset,
        batches,
        sold_out: sold_out.load(Ordering::Relaxed),
        interrupted: shutdown.load(Ordering::Relaxed),
        duplicates,
        stats: shared.stats(),
    };

    metrics::record_stats(&report.stats);

    tracing::info!(
        batches = report.batches.len(),
        tokens = report.tokens(),
        available = report.stats.available,
        sold_out = report.sold_out,
        "simulation finished"
    );

    Ok(report)
}

/// Open batches until the budget runs out, the pool sells out, or a
/// shutdown is requested.
fn run_worker(
    seed: u64,
    shared: &SharedIssuer,
    remaining: &AtomicU64,
    sold_out: &AtomicBool,
    shutdown: &AtomicBool,
) -> Result<Vec<OpenedBatch>, ShuffleError> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut batches = Vec::new();

    loop {
        if shutdown.load(Ordering::Relaxed) || sold_out.load(Ordering::Relaxed) {
            break;
        }

        // Claim one open from the budget
        if remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_err()
        {
            break;
        }

        match shared.open_next(rng.random()) {
            Ok(batch) => batches.push(batch),
            Err(e) if e.is_sold_out() => {
                sold_out.store(true, Ordering::Relaxed);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(batches)
}

/// Write `seq identity uri` for every reserved and minted token.
fn write_tokens<W: Write>(
    config: &Config,
    shared: &SharedIssuer,
    batches: &[OpenedBatch],
    out: &mut W,
) -> Result<(), SimulationError> {
    let uri = config.metadata.token_uri();

    shared.with(|issuer| -> Result<(), SimulationError> {
        if let Some(range) = issuer.reserved() {
            for seq in range.first()..range.end() {
                let identity = issuer.identity(seq)?;
                writeln!(out, "{} {} {}", seq, identity, uri.resolve(issuer, seq)?)?;
            }
        }

        for batch in batches {
            for (i, identity) in batch.identities.iter().enumerate() {
                let seq = batch.batch_start + i as u64;
                writeln!(out, "{} {} {}", seq, identity, uri.for_identity(*identity))?;
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> Config {
        Config::parse(toml).unwrap()
    }

    #[test]
    fn test_runs_until_sold_out() {
        let config = config("[pool]\npool_size = 20\n");
        let shutdown = AtomicBool::new(false);
        let mut out = Vec::new();

        let report = run(&config, 42, &shutdown, &mut out).unwrap();
        assert_eq!(report.batches.len(), 20);
        assert_eq!(report.tokens(), 80);
        assert!(report.sold_out);
        assert!(!report.interrupted);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.stats.available, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_respects_open_budget() {
        let config = config("[pool]\npool_size = 20\n[simulation]\nopens = 5\n");
        let shutdown = AtomicBool::new(false);
        let report = run(&config, 1, &shutdown, &mut std::io::sink()).unwrap();

        assert_eq!(report.batches.len(), 5);
        assert!(!report.sold_out);
        assert_eq!(report.stats.available, 15);
        let starts: Vec<u64> = report.batches.iter().map(|b| b.batch_start).collect();
        assert_eq!(starts, vec![0, 4, 8, 12, 16]);
    }

    #[test]
    fn test_same_seed_same_offsets() {
        let config = config("[pool]\npool_size = 100\n[simulation]\nopens = 10\n");
        let shutdown = AtomicBool::new(false);

        let a = run(&config, 7, &shutdown, &mut std::io::sink()).unwrap();
        let b = run(&config, 7, &shutdown, &mut std::io::sink()).unwrap();
        assert_eq!(a.batches, b.batches);
    }

    #[test]
    fn test_shutdown_stops_before_opening() {
        let config = config("[pool]\npool_size = 20\n");
        let shutdown = AtomicBool::new(true);
        let report = run(&config, 1, &shutdown, &mut std::io::sink()).unwrap();

        assert!(report.batches.is_empty());
        assert!(report.interrupted);
        assert_eq!(report.stats.available, 20);
    }

    #[test]
    fn test_prints_reserved_and_minted_tokens() {
        let toml = "[pool]\npool_size = 2\nbatch_size = 2\nstart_id = 3\nidentity_origin = 3\n\
                    [reserve]\nfirst = 1\ncount = 2\n\
                    [metadata]\nbase_uri = \"uri/{}\"\n\
                    [simulation]\nprint_tokens = true\n";
        let config = config(toml);
        let shutdown = AtomicBool::new(false);
        let mut out = Vec::new();

        let report = run(&config, 3, &shutdown, &mut out).unwrap();
        assert!(report.reserved_offset.is_some());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + 4);
        assert!(lines[0].starts_with("1 "));
        assert!(lines[2].starts_with("3 "));
        assert!(lines.iter().all(|l| l.contains(" uri/")));
    }

    #[test]
    fn test_reserved_identities_count_as_duplicates() {
        // skips validation, which rejects the overlap
        let toml = "[pool]\npool_size = 2\nbatch_size = 2\nstart_id = 3\n\
                    [reserve]\nfirst = 1\ncount = 2\n";
        let config: Config = toml::from_str(toml).unwrap();
        let shutdown = AtomicBool::new(false);

        let report = run(&config, 3, &shutdown, &mut std::io::sink()).unwrap();
        assert!(report.sold_out);
        // minted covers 0..4, the reserve resolves to 1 and 2
        assert_eq!(report.duplicates, 2);
    }
}
