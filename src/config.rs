use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub const DEFAULT_CONFIG_FILE: &str = "gamedata.json";
pub const DEFAULT_CATALOG_BASE_URL: &str = "http://www.vgchartz.com";
pub const DEFAULT_RATINGS_BASE_URL: &str = "http://www.metacritic.com";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub catalog_base_url: Option<String>,
    #[serde(default)]
    pub ratings_base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub max_records: Option<usize>,
    #[serde(default)]
    pub wait_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub catalog_base_url: String,
    pub ratings_base_url: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub user_agent: String,
    pub output_dir: Utf8PathBuf,
    /// 0 means no cap.
    pub max_records: usize,
    pub wait: Duration,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_records: Option<usize>,
    pub wait_secs: Option<u64>,
    pub output_dir: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` if given, else `gamedata.json` when present, else defaults.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ScrapeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| ScrapeError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| ScrapeError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ScrapeError> {
        let schema_version = config.schema_version.unwrap_or(SCHEMA_VERSION);
        if schema_version != SCHEMA_VERSION {
            return Err(ScrapeError::InvalidConfig(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let catalog_base_url = base_url(config.catalog_base_url, DEFAULT_CATALOG_BASE_URL)?;
        let ratings_base_url = base_url(config.ratings_base_url, DEFAULT_RATINGS_BASE_URL)?;

        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ScrapeError::InvalidConfig(
                "page_size must be greater than 0".to_string(),
            ));
        }

        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ScrapeError::InvalidConfig(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .unwrap_or_else(|| ".".to_string());

        Ok(ResolvedConfig {
            catalog_base_url,
            ratings_base_url,
            page_size,
            timeout: Duration::from_secs(timeout_secs),
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
            output_dir: Utf8PathBuf::from(output_dir),
            max_records: overrides
                .max_records
                .or(config.max_records)
                .unwrap_or(0),
            wait: Duration::from_secs(overrides.wait_secs.or(config.wait_secs).unwrap_or(0)),
        })
    }
}

pub fn default_user_agent() -> String {
    format!("gamedata-scraper/{}", env!("CARGO_PKG_VERSION"))
}

fn base_url(value: Option<String>, default: &str) -> Result<String, ScrapeError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ScrapeError::InvalidConfig(format!(
            "base url must be http(s): {value}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.catalog_base_url, DEFAULT_CATALOG_BASE_URL);
        assert_eq!(resolved.ratings_base_url, DEFAULT_RATINGS_BASE_URL);
        assert_eq!(resolved.page_size, 1000);
        assert_eq!(resolved.max_records, 0);
        assert_eq!(resolved.wait, Duration::ZERO);
        assert_eq!(resolved.output_dir, Utf8PathBuf::from("."));
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let config = Config {
            schema_version: Some(2),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfig(_)));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let config = Config {
            ratings_base_url: Some("https://www.metacritic.com/".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.ratings_base_url, "https://www.metacritic.com");
    }
}
