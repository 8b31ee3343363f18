//! Mint configuration.
//!
//! One pool per configuration file, plus logging, metadata and simulation
//! settings.

use serde::Deserialize;
use shuffle_core::{BatchIssuer, PoolConfig, TokenUri};
use std::path::Path;

/// Configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity pool parameters
    pub pool: PoolSection,

    /// Optional reserved range minted before the first batch
    #[serde(default)]
    pub reserve: Option<ReserveConfig>,

    /// Metadata URI templates
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Simulation settings
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include thread names
    #[serde(default)]
    pub thread_names: bool,

    /// Include module target
    #[serde(default = "default_true")]
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
            thread_names: false,
            target: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// Newline-delimited JSON
    Json,
    /// Single-line output
    Compact,
}

/// Identity pool parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    /// Number of distinct offsets (batches) the pool can hand out
    pub pool_size: u64,

    /// Tokens per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// First sequence number issued through batches
    #[serde(default)]
    pub start_id: u64,

    /// Identity space size (default: pool_size * batch_size)
    #[serde(default)]
    pub identity_space: Option<u64>,

    /// Added to every shuffled identity
    #[serde(default)]
    pub identity_origin: u64,
}

impl PoolSection {
    /// Convert to the allocator's pool config.
    pub fn pool_config(&self) -> PoolConfig {
        let config = PoolConfig::new(self.pool_size, self.batch_size)
            .with_start_id(self.start_id)
            .with_identity_origin(self.identity_origin);
        match self.identity_space {
            Some(space) => config.with_identity_space(space),
            None => config,
        }
    }
}

/// Reserved range configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReserveConfig {
    /// First reserved sequence number
    #[serde(default = "default_reserve_first")]
    pub first: u64,

    /// Number of reserved tokens
    pub count: u64,
}

/// Metadata URI configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Base URI, `{}` is replaced by the identity
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// URI for tokens whose batch has not been opened
    #[serde(default)]
    pub hidden_uri: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            hidden_uri: None,
        }
    }
}

impl MetadataConfig {
    /// Build the URI resolver.
    pub fn token_uri(&self) -> TokenUri {
        let uri = TokenUri::new(self.base_uri.clone());
        match &self.hidden_uri {
            Some(hidden) => uri.with_hidden_uri(hidden.clone()),
            None => uri,
        }
    }
}

/// Simulation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of batches to open (default: until sold out)
    #[serde(default)]
    pub opens: Option<u64>,

    /// Seed for the deterministic seed source (default: from entropy)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Number of worker threads opening batches concurrently
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Print one line per minted token
    #[serde(default)]
    pub print_tokens: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            opens: None,
            seed: None,
            threads: default_threads(),
            print_tokens: false,
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> u64 {
    4
}

fn default_reserve_first() -> u64 {
    1
}

fn default_base_uri() -> String {
    "https://placeholder.com/{}.json".to_string()
}

fn default_threads() -> usize {
    1
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// The values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool
            .pool_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(ref reserve) = self.reserve {
            if reserve.count == 0 {
                return Err(ConfigError::Invalid("reserve.count must be > 0".into()));
            }
            if reserve.first.saturating_add(reserve.count) > self.pool.start_id {
                return Err(ConfigError::Invalid(format!(
                    "reserved range [{}, {}) overlaps pool.start_id ({})",
                    reserve.first,
                    reserve.first.saturating_add(reserve.count),
                    self.pool.start_id
                )));
            }

            let pool = self.pool.pool_config();
            let minted_start = pool.identity_origin as u128;
            let minted_end = minted_start + pool.identity_space as u128;
            let reserved_start = reserve.first as u128;
            let reserved_end = reserved_start + reserve.count as u128;
            if reserved_start < minted_end && minted_start < reserved_end {
                return Err(ConfigError::Invalid(format!(
                    "reserved identities [{}, {}) overlap pool identities [{}, {})",
                    reserved_start, reserved_end, minted_start, minted_end
                )));
            }
        }

        if self.simulation.threads == 0 {
            return Err(ConfigError::Invalid("simulation.threads must be > 0".into()));
        }

        Ok(())
    }

    /// Build the issuer described by this configuration.
    pub fn issuer(&self) -> Result<BatchIssuer, ConfigError> {
        let issuer = BatchIssuer::new(self.pool.pool_config())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        match &self.reserve {
            Some(reserve) => issuer
                .with_reserved(reserve.first, reserve.count)
                .map_err(|e| ConfigError::Invalid(e.to_string())),
            None => Ok(issuer),
        }
    }
}

/// Commented default configuration, printed by `--print-config`.
pub const DEFAULT_CONFIG: &str = r#"# Mint Configuration

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
# Can be overridden with RUST_LOG environment variable
level = "info"
# Log format: "pretty" (human-readable), "json", or "compact"
format = "pretty"
# Include timestamps
timestamps = true
# Include thread names
thread_names = false
# Include module target
target = true

[pool]
# Number of batches that can ever be opened
pool_size = 5000
# Tokens minted per opened batch
batch_size = 4
# First sequence number minted through batches
start_id = 1000
# Size of the identity space (default: pool_size * batch_size)
# identity_space = 20000
# Added to every shuffled identity, keeps them clear of the reserved range
identity_origin = 1000

# Tokens minted before the first batch, resolved by a single offset
[reserve]
first = 1
count = 999

[metadata]
# "{}" is replaced by the token's identity
base_uri = "https://placeholder.com/{}.json"
# Returned for tokens whose batch has not been opened
# hidden_uri = "https://placeholder.com/hidden.json"

[simulation]
# Number of batches to open (default: until sold out)
# opens = 100
# Seed for reproducible runs (default: from entropy)
# seed = 42
# Worker threads opening batches concurrently
threads = 1
# Print one line per token: sequence, identity, uri
print_tokens = false
"#;
