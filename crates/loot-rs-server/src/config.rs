use serde::Deserialize;
use std::path::Path;

use loot_rs_core::LootConfig;
use loot_rs_table::DropRates;

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub loot: LootConfig,
    #[serde(default)]
    pub rates: DropRates,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Tick length in milliseconds; rolls advance by this much per tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Directory holding `items.json` and `loot/*.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Fixed seed for reproducible sessions.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_data_dir() -> String {
    "data".into()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            data_dir: default_data_dir(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
