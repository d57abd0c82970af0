use crate::error::{LibrisError, Result};
use crate::service::http::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_MOCK_DELAY_MS: u64 = 300;

pub const ENV_API_MODE: &str = "LIBRIS_API_MODE";
pub const ENV_API_URL: &str = "LIBRIS_API_URL";
pub const ENV_MOCK_DELAY: &str = "LIBRIS_MOCK_DELAY";
pub const ENV_SEED: &str = "LIBRIS_SEED";
pub const ENV_ORPHANS: &str = "LIBRIS_ORPHANS";

/// Which backend answers catalog calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Mock,
    Real,
}

impl FromStr for ApiMode {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ApiMode::Mock),
            "real" => Ok(ApiMode::Real),
            other => Err(LibrisError::Config(format!(
                "Unknown api mode: {} (expected mock or real)",
                other
            ))),
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiMode::Mock => f.write_str("mock"),
            ApiMode::Real => f.write_str("real"),
        }
    }
}

/// What happens to inventory items when their book or store is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Leave them; joins render the missing side as "Unknown".
    #[default]
    Keep,
    /// Delete them along with the book or store.
    Cascade,
}

impl FromStr for OrphanPolicy {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(OrphanPolicy::Keep),
            "cascade" => Ok(OrphanPolicy::Cascade),
            other => Err(LibrisError::Config(format!(
                "Unknown orphan policy: {} (expected keep or cascade)",
                other
            ))),
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrphanPolicy::Keep => f.write_str("keep"),
            OrphanPolicy::Cascade => f.write_str("cascade"),
        }
    }
}

/// Configuration for libris, stored in `<data dir>/config.json` and
/// overridable from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibrisConfig {
    #[serde(default)]
    pub api_mode: ApiMode,

    /// Base address of the real backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Simulated round trip of the mock backend, in milliseconds
    #[serde(default = "default_mock_delay")]
    pub mock_delay_ms: u64,

    /// Seed directory or `http(s)://` base URL; bundled seeds when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    #[serde(default)]
    pub orphans: OrphanPolicy,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_mock_delay() -> u64 {
    DEFAULT_MOCK_DELAY_MS
}

impl Default for LibrisConfig {
    fn default() -> Self {
        Self {
            api_mode: ApiMode::default(),
            api_url: default_api_url(),
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
            seed: None,
            orphans: OrphanPolicy::default(),
        }
    }
}

/// Keys accepted by [`LibrisConfig::get`] and [`LibrisConfig::set`].
pub const KEYS: [&str; 5] = ["api-mode", "api-url", "mock-delay", "seed", "orphans"];

impl LibrisConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(LibrisError::Io)?;
        let config: LibrisConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(LibrisError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(LibrisError::Io)?;
        Ok(())
    }

    /// Apply overrides from environment-style lookups. Unset or empty
    /// variables leave the current value alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var(ENV_API_MODE) {
            self.api_mode = v.parse()?;
        }
        if let Some(v) = var(ENV_API_URL) {
            self.api_url = v;
        }
        if let Some(v) = var(ENV_MOCK_DELAY) {
            self.mock_delay_ms = parse_delay(&v)?;
        }
        if let Some(v) = var(ENV_SEED) {
            self.seed = Some(v);
        }
        if let Some(v) = var(ENV_ORPHANS) {
            self.orphans = v.parse()?;
        }
        Ok(())
    }

    /// File config with process environment overrides on top.
    pub fn resolve<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let mut config = Self::load(config_dir)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "api-mode" => Ok(self.api_mode.to_string()),
            "api-url" => Ok(self.api_url.clone()),
            "mock-delay" => Ok(self.mock_delay_ms.to_string()),
            "seed" => Ok(self.seed.clone().unwrap_or_else(|| "bundled".to_string())),
            "orphans" => Ok(self.orphans.to_string()),
            other => Err(unknown_key(other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api-mode" => self.api_mode = value.parse()?,
            "api-url" => self.api_url = value.trim_end_matches('/').to_string(),
            "mock-delay" => self.mock_delay_ms = parse_delay(value)?,
            "seed" => {
                self.seed = match value {
                    "" | "bundled" => None,
                    other => Some(other.to_string()),
                }
            }
            "orphans" => self.orphans = value.parse()?,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }
}

fn parse_delay(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| LibrisError::Config(format!("Invalid mock delay: {}", value)))
}

fn unknown_key(key: &str) -> LibrisError {
    LibrisError::Config(format!(
        "Unknown config key: {} (known: {})",
        key,
        KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = LibrisConfig::default();
        assert_eq!(config.api_mode, ApiMode::Mock);
        assert_eq!(config.api_url, "http://localhost:3000/api");
        assert_eq!(config.mock_delay(), Duration::from_millis(300));
        assert_eq!(config.orphans, OrphanPolicy::Keep);
    }

    #[test]
    fn test_load_missing_config() {
        let temp = tempfile::tempdir().unwrap();
        let config = LibrisConfig::load(temp.path().join("absent")).unwrap();
        assert_eq!(config, LibrisConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = LibrisConfig::default();
        config.set("api-mode", "real").unwrap();
        config.set("orphans", "cascade").unwrap();
        config.save(temp.path()).unwrap();

        let loaded = LibrisConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.api_mode, ApiMode::Real);
        assert_eq!(loaded.orphans, OrphanPolicy::Cascade);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("config.json"), r#"{"mock_delay_ms": 5}"#).unwrap();
        let config = LibrisConfig::load(temp.path()).unwrap();
        assert_eq!(config.mock_delay_ms, 5);
        assert_eq!(config.api_url, "http://localhost:3000/api");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = LibrisConfig::default();
        config
            .apply_env(env(&[
                ("LIBRIS_API_MODE", "REAL"),
                ("LIBRIS_API_URL", "https://books.example/api"),
                ("LIBRIS_MOCK_DELAY", "0"),
                ("LIBRIS_SEED", "/srv/seed"),
                ("LIBRIS_ORPHANS", ""),
            ]))
            .unwrap();

        assert_eq!(config.api_mode, ApiMode::Real);
        assert_eq!(config.api_url, "https://books.example/api");
        assert_eq!(config.mock_delay_ms, 0);
        assert_eq!(config.seed.as_deref(), Some("/srv/seed"));
        assert_eq!(config.orphans, OrphanPolicy::Keep);
    }

    #[test]
    fn test_bad_env_values_are_config_errors() {
        let mut config = LibrisConfig::default();
        let err = config
            .apply_env(env(&[("LIBRIS_MOCK_DELAY", "soon")]))
            .unwrap_err();
        assert!(matches!(err, LibrisError::Config(_)));

        let err = config
            .apply_env(env(&[("LIBRIS_API_MODE", "staging")]))
            .unwrap_err();
        assert!(matches!(err, LibrisError::Config(_)));
    }

    #[test]
    fn test_get_and_set_by_key() {
        let mut config = LibrisConfig::default();
        assert_eq!(config.get("seed").unwrap(), "bundled");
        config.set("seed", "./data").unwrap();
        assert_eq!(config.get("seed").unwrap(), "./data");
        config.set("seed", "bundled").unwrap();
        assert_eq!(config.seed, None);

        config.set("api-url", "http://h/api/").unwrap();
        assert_eq!(config.get("api-url").unwrap(), "http://h/api");

        assert!(config.get("file-ext").is_err());
        assert!(config.set("file-ext", ".md").is_err());
    }
}
