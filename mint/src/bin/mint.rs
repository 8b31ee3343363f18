//! Mint simulation binary.

use clap::Parser;
use mint::banner::{BannerConfig, print_banner};
use mint::config::{Config, DEFAULT_CONFIG};
use mint::{logging, report, signal, simulate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mint")]
#[command(about = "Open shuffled token batches from a configured pool")]
struct Args {
    /// Path to configuration file
    config: Option<PathBuf>,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Number of batches to open (overrides config)
    #[arg(long)]
    opens: Option<u64>,

    /// Seed for a reproducible run (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (overrides config)
    #[arg(long)]
    threads: Option<usize>,

    /// Print one line per token
    #[arg(long)]
    print_tokens: bool,

    /// Print metrics after the run
    #[arg(long)]
    metrics: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        print!("{}", DEFAULT_CONFIG);
        return;
    }

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            eprintln!("No config file specified. Use <path> or --print-config");
            std::process::exit(1);
        }
    };

    if let Some(opens) = args.opens {
        config.simulation.opens = Some(opens);
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(threads) = args.threads {
        config.simulation.threads = threads;
    }
    if args.print_tokens {
        config.simulation.print_tokens = true;
    }

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, args.metrics) {
        tracing::error!(error = %e, "Mint error");
        std::process::exit(1);
    }
}

fn run(config: Config, print_metrics: bool) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = signal::install_signal_handler()?;
    let seed = config.simulation.seed.unwrap_or_else(rand::random);
    let pool = config.pool.pool_config();

    print_banner(&BannerConfig {
        version: env!("CARGO_PKG_VERSION"),
        pool_size: pool.pool_size,
        batch_size: pool.batch_size,
        start_id: pool.start_id,
        identity_space: pool.identity_space,
        identity_origin: pool.identity_origin,
        reserve: config.reserve.as_ref().map(|r| (r.first, r.count)),
        threads: config.simulation.threads,
        opens: config.simulation.opens,
        seed,
    });

    let mut out = std::io::BufWriter::new(std::io::stdout());
    let result = simulate::run(&config, seed, &shutdown, &mut out)?;
    std::io::Write::flush(&mut out)?;
    drop(out);

    println!();
    print!("{}", report::render_summary(&result));

    if print_metrics {
        println!();
        print!("{}", report::render_metrics());
    }

    if result.duplicates > 0 {
        return Err(format!("{} identities issued more than once", result.duplicates).into());
    }

    Ok(())
}
