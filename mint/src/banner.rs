//! Startup banner utilities.

use std::fmt::Write;

/// Configuration for the startup banner.
pub struct BannerConfig<'a> {
    /// Version string
    pub version: &'a str,
    /// Number of batches in the pool
    pub pool_size: u64,
    /// Tokens per batch
    pub batch_size: u64,
    /// First batch sequence number
    pub start_id: u64,
    /// Identity space size
    pub identity_space: u64,
    /// Value added to every identity
    pub identity_origin: u64,
    /// Reserved range as (first, count)
    pub reserve: Option<(u64, u64)>,
    /// Number of worker threads
    pub threads: usize,
    /// Batches to open, `None` for until sold out
    pub opens: Option<u64>,
    /// Seed the run derives from
    pub seed: u64,
}

/// Render the banner as a string.
pub fn render_banner(config: &BannerConfig) -> String {
    let mut output = String::with_capacity(512);

    let name = "mint";
    writeln!(output, "{} v{}", name, config.version).unwrap();
    writeln!(
        output,
        "{}",
        "=".repeat(name.len() + config.version.len() + 2)
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(output, "Pool:").unwrap();
    writeln!(output, "  Batches:   {}", config.pool_size).unwrap();
    writeln!(output, "  Batch:     {}", config.batch_size).unwrap();
    writeln!(output, "  Start:     {}", config.start_id).unwrap();
    writeln!(output, "  Space:     {}", config.identity_space).unwrap();
    if config.identity_origin != 0 {
        writeln!(output, "  Origin:    {}", config.identity_origin).unwrap();
    }

    if let Some((first, count)) = config.reserve {
        writeln!(output, "  Reserved:  {}..{}", first, first.saturating_add(count)).unwrap();
    }

    writeln!(output).unwrap();

    writeln!(output, "Simulation:").unwrap();
    writeln!(output, "  Threads:   {}", config.threads).unwrap();
    match config.opens {
        Some(opens) => writeln!(output, "  Opens:     {}", opens).unwrap(),
        None => writeln!(output, "  Opens:     until sold out").unwrap(),
    }
    writeln!(output, "  Seed:      {:#018x}", config.seed).unwrap();

    writeln!(output).unwrap();

    output
}

/// Print a startup banner to stdout.
pub fn print_banner(config: &BannerConfig) {
    print!("{}", render_banner(config));
}
