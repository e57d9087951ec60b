use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ask::DEFAULT_ENDPOINT;
use crate::conversation::DEFAULT_GREETING;

pub const ENDPOINT_ENV: &str = "DAVINCI_ENDPOINT";
pub const REVEAL_DELAY_ENV: &str = "DAVINCI_REVEAL_DELAY_MS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub reveal_delay_ms: u64,
    pub greeting: String,
    pub request_timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reveal_delay_ms: 50,
            greeting: DEFAULT_GREETING.to_string(),
            request_timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults if the file
    /// doesn't exist yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Apply `DAVINCI_*` environment overrides
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(REVEAL_DELAY_ENV).ok(),
        )
    }

    fn with_overrides(mut self, endpoint: Option<String>, delay: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(delay) = delay {
            self.reveal_delay_ms = delay
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a whole number of milliseconds, got {:?}", REVEAL_DELAY_ENV, delay))?;
        }
        Ok(self)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("davinci").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.reveal_delay(), Duration::from_millis(50));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            endpoint: "http://notes.local:8080/ask".to_string(),
            request_timeout_secs: Some(30),
            ..Config::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"reveal_delay_ms": 10}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.reveal_delay_ms, 10);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(Some("http://other/ask".to_string()), Some(" 5 ".to_string()))
            .unwrap();
        assert_eq!(config.endpoint, "http://other/ask");
        assert_eq!(config.reveal_delay_ms, 5);

        let blank = Config::default().with_overrides(Some("  ".to_string()), None).unwrap();
        assert_eq!(blank.endpoint, DEFAULT_ENDPOINT);

        assert!(Config::default().with_overrides(None, Some("fast".to_string())).is_err());
    }
}
