use anyhow::{Context, Result};
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
/// NewsAPI's largest page size.
pub const MAX_HEADLINE_LIMIT: usize = 100;

/// Runtime settings read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub polygon_api_key: String,
    pub polygon_rate_limit: usize,
    pub news_api_key: Option<String>,
    pub lookback_days: i64,
    pub headline_limit: usize,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let polygon_api_key = lookup("POLYGON_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .context("POLYGON_API_KEY must be set")?;

        let news_api_key = lookup("NEWS_API_KEY").filter(|k| !k.trim().is_empty());

        let lookback_days: i64 = parse_or(&lookup, "LOOKBACK_DAYS", 365)?;
        if lookback_days < 1 {
            anyhow::bail!("LOOKBACK_DAYS must be positive, got {}", lookback_days);
        }

        let headline_limit: usize =
            parse_or(&lookup, "HEADLINE_LIMIT", analysis_orchestrator::DEFAULT_HEADLINE_LIMIT)?;
        if !(1..=MAX_HEADLINE_LIMIT).contains(&headline_limit) {
            anyhow::bail!(
                "HEADLINE_LIMIT must be between 1 and {}, got {}",
                MAX_HEADLINE_LIMIT,
                headline_limit
            );
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            polygon_api_key,
            polygon_rate_limit: parse_or(&lookup, "POLYGON_RATE_LIMIT", polygon_client::DEFAULT_RATE_LIMIT)?,
            news_api_key,
            lookback_days,
            headline_limit,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
