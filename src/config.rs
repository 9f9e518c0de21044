use std::path::{Path, PathBuf};

use crate::{
    history::DEFAULT_MAX_RECORDS,
    semantic::{DEFAULT_MODEL, DEFAULT_THRESHOLD},
    storage::{BackendLocal, StorageManager},
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";

/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
/// Records returned by `/history` when no limit is given
const DEFAULT_RECENT_LIMIT: usize = 10;
const DEFAULT_LISTEN: &str = "0.0.0.0:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("config file is not valid utf8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for semantic retrieval
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_model")]
    pub model: String,

    /// Minimum cosine similarity to accept a match as confident (exclusive)
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// YAML list of `{question, answer}` replacing the built-in knowledge base
    #[serde(default)]
    pub knowledge_base: Option<PathBuf>,

    /// Replaces the built-in fallback answer
    #[serde(default)]
    pub fallback_answer: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            threshold: DEFAULT_THRESHOLD,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            knowledge_base: None,
            fallback_answer: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    /// Records kept on disk, oldest evicted first
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.retrieval.threshold;
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.threshold must be between -1.0 and 1.0, got {}",
                threshold
            )));
        }

        if self.retrieval.download_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.download_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.history.max_records == 0 {
            return Err(ConfigError::Invalid(
                "history.max_records must be greater than 0".to_string(),
            ));
        }

        if self.server.listen.trim().is_empty() {
            return Err(ConfigError::Invalid("server.listen is empty".to_string()));
        }

        Ok(())
    }

    /// Read `config.yaml` from `base_path`, creating it with defaults first.
    ///
    /// A relative `retrieval.knowledge_base` is resolved against `base_path`.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let store = BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        if let Some(kb) = &config.retrieval.knowledge_base {
            if kb.is_relative() {
                config.retrieval.knowledge_base = Some(base_path.join(kb));
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let store = BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
