//! Configuration management for the lot lineage service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LOTS_ prefix

use config::{ConfigError, Environment, File};
use lot_lineage::{validate_policy, GroupingPolicy};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// How roots are grouped into virtual batches
    pub grouping: GroupingConfig,

    /// Snapshot store configuration
    pub store: StoreConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupingConfig {
    /// Site offset from UTC in minutes, used to find the lot day
    pub utc_offset_minutes: i32,

    /// Merge roots without a genetic or location into the "unknown" bucket
    pub merge_unattributed: bool,
}

impl GroupingConfig {
    pub fn policy(&self) -> GroupingPolicy {
        GroupingPolicy {
            utc_offset_minutes: self.utc_offset_minutes,
            merge_unattributed: self.merge_unattributed,
        }
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> AppResult<()> {
        validate_policy(&self.policy()).map_err(|message| {
            AppError::Configuration(format!(
                "grouping.utc_offset_minutes = {}: {}",
                self.utc_offset_minutes, message
            ))
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// JSON file holding an array of batch records
    pub snapshot_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Default filter when RUST_LOG is unset
    pub filter: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LOTS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("grouping.utc_offset_minutes", 0)?
            .set_default("grouping.merge_unattributed", true)?
            .set_default("store.snapshot_path", "data/batches.json")?
            .set_default("logging.json", false)?
            .set_default(
                "logging.filter",
                "lot_lineage=debug,lot_lineage_service=debug,lot_report=info",
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LOTS_ prefix)
            .add_source(
                Environment::with_prefix("LOTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
