//! Configuration loader for the `storeclimate` backend service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). Consolidating the `env::var` calls here
//! keeps the rest of the codebase free of configuration plumbing.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Sheet locator: a URL whose body is the sheet as CSV.
    pub sheet_url: String,

    /// Connection name for the upstream source; part of the cache key.
    pub sheet_connection: String,

    /// Freshness window for cached fetches, in seconds.
    pub cache_ttl_secs: u32,

    /// Number of enumerated stores ("Store 1".."Store N").
    pub store_count: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SHEET_URL` – sheet locator (CSV export URL)
///
/// Optional:
/// - `SHEET_CONNECTION` – connection name (default: `gsheets`)
/// - `CACHE_TTL_SECS` – cache freshness window (default: 600)
/// - `STORE_COUNT` – number of stores (default: 8)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let sheet_url = require_env!("SHEET_URL");
    let sheet_connection =
        env::var("SHEET_CONNECTION").unwrap_or_else(|_| "gsheets".to_string());
    let cache_ttl_secs = parse_env_u32!("CACHE_TTL_SECS", 600);
    let store_count = parse_env_u32!("STORE_COUNT", 8);

    Ok(Config {
        sheet_url,
        sheet_connection,
        cache_ttl_secs,
        store_count,
    })
}

impl Config {
    /// The enumerated store labels, in display order.
    pub fn store_labels(&self) -> Vec<String> {
        // ---
        (1..=self.store_count)
            .map(|i| format!("Store {i}"))
            .collect()
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SHEET_URL        : {}", self.sheet_url);
        tracing::info!("  SHEET_CONNECTION : {}", self.sheet_connection);
        tracing::info!("  CACHE_TTL_SECS   : {}", self.cache_ttl_secs);
        tracing::info!("  STORE_COUNT      : {}", self.store_count);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_store_labels() {
        // ---
        let cfg = Config {
            sheet_url: "http://example".to_string(),
            sheet_connection: "gsheets".to_string(),
            cache_ttl_secs: 600,
            store_count: 3,
        };
        assert_eq!(cfg.store_labels(), vec!["Store 1", "Store 2", "Store 3"]);
    }
}
