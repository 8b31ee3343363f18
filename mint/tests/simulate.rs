//! End-to-end runs: load a config file, simulate, and check the output.

use mint::config::{Config, ConfigError, DEFAULT_CONFIG};
use mint::simulate;
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::AtomicBool;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(DEFAULT_CONFIG);
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.pool.pool_size, 5000);
    assert_eq!(config.reserve.as_ref().map(|r| r.first), Some(1));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_default_config_sells_out_without_duplicates() {
    let config = Config::parse(DEFAULT_CONFIG).unwrap();
    let shutdown = AtomicBool::new(false);
    let report = simulate::run(&config, 0xdead_beef, &shutdown, &mut std::io::sink()).unwrap();

    assert!(report.sold_out);
    assert_eq!(report.batches.len(), 5000);
    assert_eq!(report.tokens(), 20000);
    assert_eq!(report.duplicates, 0);
    assert!(report.reserved_offset.is_some_and(|o| o < 999));

    let identities: HashSet<u64> = report
        .batches
        .iter()
        .flat_map(|b| b.identities.iter().copied())
        .collect();
    assert_eq!(identities, (1000..21000).collect());

    // reserved tokens resolve below the shuffled identities
    let mut issuer = config.issuer().unwrap();
    issuer.set_reserved_offset(0xdead_beef).unwrap();
    for seq in 1..1000 {
        let identity = issuer.identity(seq).unwrap();
        assert!((1..1000).contains(&identity));
        assert!(!identities.contains(&identity));
    }
}

#[test]
fn test_overlapping_reserve_rejected_on_load() {
    let toml = "[pool]\npool_size = 5000\nstart_id = 1000\n\
                [reserve]\nfirst = 1\ncount = 999\n";
    let file = write_config(toml);
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_multithreaded_run_covers_the_pool() {
    let toml = "[pool]\npool_size = 2000\nstart_id = 1000\n[simulation]\nthreads = 4\n";
    let config = Config::parse(toml).unwrap();
    let shutdown = AtomicBool::new(false);
    let report = simulate::run(&config, 9, &shutdown, &mut std::io::sink()).unwrap();

    assert!(report.sold_out);
    assert_eq!(report.duplicates, 0);

    let starts: Vec<u64> = report.batches.iter().map(|b| b.batch_start).collect();
    let expected: Vec<u64> = (0..2000).map(|i| 1000 + i * 4).collect();
    assert_eq!(starts, expected);

    let offsets: HashSet<u64> = report.batches.iter().map(|b| b.offset).collect();
    assert_eq!(offsets.len(), 2000);
}

#[test]
fn test_wrapping_space_reports_duplicates() {
    // 10 batches of 4 squeezed into 20 identities must collide once sold out
    let toml = "[pool]\npool_size = 10\nidentity_space = 20\n";
    let config = Config::parse(toml).unwrap();
    let shutdown = AtomicBool::new(false);
    let report = simulate::run(&config, 1, &shutdown, &mut std::io::sink()).unwrap();

    assert!(report.sold_out);
    assert!(report.duplicates > 0);
    assert!(
        report
            .batches
            .iter()
            .flat_map(|b| b.identities.iter())
            .all(|&id| id < 20)
    );
}

#[test]
fn test_token_lines_use_base_uri() {
    let toml = "[pool]\npool_size = 4\nbatch_size = 1\nstart_id = 10\n\
                [metadata]\nbase_uri = \"ipfs://cid/{}\"\nhidden_uri = \"ipfs://hidden\"\n\
                [simulation]\nprint_tokens = true\nopens = 2\n";
    let config = Config::parse(toml).unwrap();
    let shutdown = AtomicBool::new(false);
    let mut out = Vec::new();
    let report = simulate::run(&config, 11, &shutdown, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    for (line, batch) in lines.iter().zip(&report.batches) {
        let identity = batch.identities[0];
        assert_eq!(
            *line,
            format!("{} {} ipfs://cid/{}", batch.batch_start, identity, identity)
        );
    }
}
