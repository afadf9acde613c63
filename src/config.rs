use std::env;
use std::time::Duration;

use crate::blockchain::GENESIS_NAME;
use crate::error::ConfigError;
use crate::mining::{OutputFormat, RoundMode};

/// Default number of mining rounds per run.
pub const DEFAULT_ROUNDS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct MinerConfig {
    pub rounds: usize,
    /// `None` keeps the genesis chain's default difficulty.
    pub difficulty: Option<u32>,
    /// Per-round nonce budget; `None` keeps the genesis chain's `2^32`.
    pub max_nonce: Option<u64>,
    /// Nonce the genesis candidate starts searching from.
    pub start_nonce: Option<u64>,
    /// Wall-clock limit for the whole run.
    pub time_limit: Option<Duration>,
    pub mode: RoundMode,
    pub output: OutputFormat,
    pub genesis_name: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            difficulty: None,
            max_nonce: None,
            start_nonce: None,
            time_limit: None,
            mode: RoundMode::default(),
            output: OutputFormat::default(),
            genesis_name: GENESIS_NAME.to_string(),
        }
    }
}

impl MinerConfig {
    /// Read `MINER_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("MINER_ROUNDS") {
            config.rounds = parse("MINER_ROUNDS", &value)?;
        }
        if let Some(value) = lookup("MINER_DIFFICULTY") {
            config.difficulty = Some(parse("MINER_DIFFICULTY", &value)?);
        }
        if let Some(value) = lookup("MINER_MAX_NONCE") {
            config.max_nonce = Some(parse("MINER_MAX_NONCE", &value)?);
        }
        if let Some(value) = lookup("MINER_START_NONCE") {
            config.start_nonce = Some(parse("MINER_START_NONCE", &value)?);
        }
        if let Some(value) = lookup("MINER_TIME_LIMIT_SECS") {
            let secs: u64 = parse("MINER_TIME_LIMIT_SECS", &value)?;
            config.time_limit = Some(Duration::from_secs(secs));
        }
        if let Some(value) = lookup("MINER_MODE") {
            config.mode = value.parse()?;
        }
        if let Some(value) = lookup("MINER_OUTPUT") {
            config.output = value.parse()?;
        }
        if let Some(value) = lookup("MINER_GENESIS_NAME") {
            config.genesis_name = value;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
