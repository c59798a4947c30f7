use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use murmur_feed::{FeedConfig, ReadMarkerPolicy, RetainedRows};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub feed: FeedConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("MURMUR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MURMUR_JWT_SECRET is unset or still a placeholder; it must match the auth service's secret");
        }

        let host = get("MURMUR_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("MURMUR_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("MURMUR_PORT")?;
        let db_path: PathBuf = get("MURMUR_DB_PATH").unwrap_or_else(|| "murmur.db".into()).into();

        let read_marker_policy = match get("MURMUR_READ_MARKER_POLICY") {
            Some(raw) => raw.parse::<ReadMarkerPolicy>().map_err(anyhow::Error::msg)?,
            None => ReadMarkerPolicy::default(),
        };

        let defaults = RetainedRows::default();
        let retain_on_reset = RetainedRows {
            channels: match get("MURMUR_RESET_KEEP_CHANNELS") {
                Some(raw) => raw.parse().context("MURMUR_RESET_KEEP_CHANNELS")?,
                None => defaults.channels,
            },
            messages: match get("MURMUR_RESET_KEEP_MESSAGES") {
                Some(raw) => raw.parse().context("MURMUR_RESET_KEEP_MESSAGES")?,
                None => defaults.messages,
            },
        };

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            feed: FeedConfig {
                read_marker_policy,
                retain_on_reset,
            },
        })
    }
}
