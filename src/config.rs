//! Process configuration
//!
//! Loaded from the environment (and `.env` via dotenv in the binaries).

use crate::error::OrchestrationError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "Maharashtra";
pub const DEFAULT_COLLECTION: &str = "telecom_plans";
pub const EMBEDDING_DIM: usize = 1536;
pub const MAX_FRESHNESS_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub product_catalog_url: Option<String>,
    pub catalog_timeout: Duration,
    pub tool_timeout: Duration,
    pub summary_timeout: Duration,
    pub search_limit: usize,
    pub default_region: String,
    pub freshness_window_days: i64,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_collection: DEFAULT_COLLECTION.to_string(),
            product_catalog_url: None,
            catalog_timeout: Duration::from_secs(5),
            tool_timeout: Duration::from_secs(10),
            summary_timeout: Duration::from_secs(20),
            search_limit: 5,
            default_region: DEFAULT_REGION.to_string(),
            freshness_window_days: 3,
            port: 8080,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let qdrant_url = match get("QDRANT_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = get("QDRANT_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = parse_or(get("QDRANT_PORT"), "QDRANT_PORT", 6333)?;
                format!("http://{}:{}", host, port)
            }
        };

        let port = match get("PORT") {
            Some(v) => parse_value(&v, "PORT")?,
            None => parse_or(get("API_PORT"), "API_PORT", defaults.port)?,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            qdrant_url,
            qdrant_collection: get("QDRANT_COLLECTION").unwrap_or(defaults.qdrant_collection),
            product_catalog_url: get("PRODUCT_CATALOG_URL"),
            catalog_timeout: Duration::from_secs(parse_or(
                get("CATALOG_TIMEOUT_SECS"),
                "CATALOG_TIMEOUT_SECS",
                5,
            )?),
            tool_timeout: Duration::from_secs(parse_or(
                get("TOOL_TIMEOUT_SECS"),
                "TOOL_TIMEOUT_SECS",
                10,
            )?),
            summary_timeout: Duration::from_secs(parse_or(
                get("SUMMARY_TIMEOUT_SECS"),
                "SUMMARY_TIMEOUT_SECS",
                20,
            )?),
            search_limit: parse_or(get("SEARCH_LIMIT"), "SEARCH_LIMIT", defaults.search_limit)?,
            default_region: get("DEFAULT_REGION").unwrap_or(defaults.default_region),
            freshness_window_days: parse_window_days(get("FRESHNESS_WINDOW_DAYS"))?,
            port,
        })
    }
}

fn parse_value<T: FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        OrchestrationError::ConfigError(format!("{} has an invalid value: {:?}", key, raw))
    })
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(v) => parse_value(&v, key),
        None => Ok(default),
    }
}

fn parse_window_days(raw: Option<String>) -> Result<i64> {
    let days = parse_or(raw, "FRESHNESS_WINDOW_DAYS", Settings::default().freshness_window_days)?;
    if !(0..=MAX_FRESHNESS_WINDOW_DAYS).contains(&days) {
        return Err(OrchestrationError::ConfigError(format!(
            "FRESHNESS_WINDOW_DAYS must be between 0 and {}, got {}",
            MAX_FRESHNESS_WINDOW_DAYS, days
        )));
    }
    Ok(days)
}
