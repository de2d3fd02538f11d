use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_PATH;
use crate::embeddings::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable holding the embedding service key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "FASHION_SEARCH_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Default embedding request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the embedding service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// API root, `/embeddings` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(skip_serializing, skip_deserializing)]
    pub api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            embedding: EmbeddingConfig::default(),
            api_key: String::new(),
        }
    }
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("catalog_path must not be empty".into()));
        }

        let emb = &self.embedding;
        if emb.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model must not be empty".into()));
        }
        if emb.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "embedding.base_url must not be empty".into(),
            ));
        }
        if emb.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "embedding.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Load settings from the config file (if any) and the API key from the
    /// environment, falling back to a `.env` file in the working directory or
    /// one of its parents.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| dotenvy::dotenv_iter().ok().and_then(api_key_from_dotenv));

        Self::load_with(&path, api_key)
    }

    /// Missing config file means defaults. A missing or blank key is an error.
    pub fn load_with(path: &Path, api_key: Option<String>) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            log::debug!("read config from {}", path.display());
            Self::from_yaml(&config_str)?
        } else {
            Self::default()
        };

        config.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        config.validate()?;

        Ok(config)
    }

    fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(config_str)?)
    }
}

/// The API key entry of a `.env` file. Process variables are left alone.
fn api_key_from_dotenv<R: Read>(entries: dotenvy::Iter<R>) -> Option<String> {
    let (_, key) = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping malformed .env line: {err}");
                None
            }
        })
        .find(|(name, _)| name == API_KEY_ENV)?;

    log::debug!("read {API_KEY_ENV} from .env");
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config =
            Config::load_with(&tmp.path().join("config.yaml"), Some("sk-test".into())).unwrap();

        assert_eq!(config.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.timeout(), Duration::from_secs(30));
        assert_eq!(config.api_key, "sk-test");
    }

    #[test]
    fn test_missing_api_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");

        assert!(matches!(
            Config::load_with(&path, None),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::load_with(&path, Some("  ".into())),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_api_key_from_dotenv() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "# local\nOTHER=1\nOPENAI_API_KEY=sk-from-file\n").unwrap();

        let key = api_key_from_dotenv(dotenvy::from_path_iter(&path).unwrap());
        assert_eq!(key.as_deref(), Some("sk-from-file"));

        let config = Config::load_with(&tmp.path().join("config.yaml"), key).unwrap();
        assert_eq!(config.api_key, "sk-from-file");
    }

    #[test]
    fn test_dotenv_without_api_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "OTHER=1\n").unwrap();

        let key = api_key_from_dotenv(dotenvy::from_path_iter(&path).unwrap());
        assert!(key.is_none());
        assert!(matches!(
            Config::load_with(&tmp.path().join("config.yaml"), key),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(
            &path,
            "catalog_path: data/products.csv\nembedding:\n  timeout_secs: 5\n",
        )
        .unwrap();

        let config = Config::load_with(&path, Some("sk-test".into())).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("data/products.csv"));
        assert_eq!(config.embedding.timeout_secs, 5);
        assert_eq!(config.embedding.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "embedding:\n  timeout_secs: 0\n").unwrap();

        assert!(matches!(
            Config::load_with(&path, Some("sk-test".into())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "embedding: [unclosed").unwrap();

        assert!(matches!(
            Config::load_with(&path, Some("sk-test".into())),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = Config {
            api_key: "sk-secret".into(),
            ..Default::default()
        };
        let yaml = serde_yml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }
}
