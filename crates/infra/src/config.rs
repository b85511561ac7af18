//! Runtime configuration for the inventory services.
//!
//! Loaded once at startup and injected; services never read the environment
//! themselves.

use thiserror::Error;

use stockwise_inventory::{DEFAULT_MIN_STOCK_ALERT, OverdrawPolicy};

pub const DEFAULT_COMMIT_RETRIES: u32 = 3;
pub const DEFAULT_STANDARD_RACKS: &str = "Rack No-1,Rack No-2,Rack No-3";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub overdraw_policy: OverdrawPolicy,
    /// Threshold used when an item carries none.
    pub default_min_stock_alert: i64,
    /// Re-runs of an operation after a version conflict before giving up.
    pub max_commit_retries: u32,
    /// Rack names every warehouse should carry.
    pub standard_racks: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            overdraw_policy: OverdrawPolicy::default(),
            default_min_stock_alert: DEFAULT_MIN_STOCK_ALERT,
            max_commit_retries: DEFAULT_COMMIT_RETRIES,
            standard_racks: parse_racks(DEFAULT_STANDARD_RACKS),
        }
    }
}

impl InventoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("STOCKWISE_OVERDRAW") {
            config.overdraw_policy = raw.parse().map_err(|e: stockwise_core::DomainError| ConfigError::Invalid {
                var: "STOCKWISE_OVERDRAW",
                message: e.to_string(),
            })?;
        }
        if let Some(raw) = lookup("STOCKWISE_MIN_STOCK_ALERT") {
            let value: i64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "STOCKWISE_MIN_STOCK_ALERT",
                message: format!("{e}"),
            })?;
            if value < 0 {
                return Err(ConfigError::Invalid {
                    var: "STOCKWISE_MIN_STOCK_ALERT",
                    message: "must not be negative".to_string(),
                });
            }
            config.default_min_stock_alert = value;
        }
        if let Some(raw) = lookup("STOCKWISE_COMMIT_RETRIES") {
            config.max_commit_retries = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "STOCKWISE_COMMIT_RETRIES",
                message: format!("{e}"),
            })?;
        }
        if let Some(raw) = lookup("STOCKWISE_STANDARD_RACKS") {
            config.standard_racks = parse_racks(&raw);
        }

        Ok(config)
    }
}

fn parse_racks(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
