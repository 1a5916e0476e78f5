#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::chunking::ChunkingConfig;
use crate::index::{EmptyChunkPolicy, ExtractionFailurePolicy};

/// Environment variable overriding the base directory.
pub const BASE_DIR_ENV: &str = "KG_INDEX_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub embedding_model: String,
    pub llm_model: String,
    pub batch_size: u32,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            embedding_model: "nomic-embed-text:latest".to_string(),
            llm_model: "llama3.1:8b".to_string(),
            batch_size: 16,
            timeout_secs: 120,
            retry_attempts: 3,
        }
    }
}

/// Index construction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    /// Run the extraction model over each chunk
    pub extract_triplets: bool,
    /// Embed every distinct triplet for similarity search
    pub include_embeddings: bool,
    /// Passed to the extraction prompt as `{max_knowledge_triplets}`
    pub max_triplets_per_chunk: usize,
    /// What to do with chunks that yield no triplets
    pub empty_chunk_policy: EmptyChunkPolicy,
    /// What to do when the extraction model fails for a chunk
    pub extraction_failure_policy: ExtractionFailurePolicy,
    /// Number of in-flight extraction requests per document
    pub extraction_concurrency: usize,
    /// Keywords never written to the keyword table
    pub stopwords: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extract_triplets: true,
            include_embeddings: false,
            max_triplets_per_chunk: 10,
            empty_chunk_policy: EmptyChunkPolicy::default(),
            extraction_failure_policy: ExtractionFailurePolicy::default(),
            extraction_concurrency: 4,
            stopwords: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid timeout: {0} (must be between 1 and 3600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid max triplets per chunk: {0} (must be between 1 and 100)")]
    InvalidMaxTriplets(usize),
    #[error("Invalid extraction concurrency: {0} (must be between 1 and 64)")]
    InvalidConcurrency(usize),
    #[error("Invalid chunk size: {0} (must be between 16 and 8192)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            index: IndexConfig::default(),
            chunking: ChunkingConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Resolve the base directory: `$KG_INDEX_HOME`, then `~/.kg-index`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(BASE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::home_dir()
            .map(|home| home.join(".kg-index"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("kg-index"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load from the default base directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = Self::config_dir().context("Failed to determine config directory")?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.index.validate()?;
        self.validate_chunking_config()?;
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(16..=8192).contains(&config.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                config.chunk_overlap,
                config.chunk_size,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Get the path for the SQLite docstore
    #[inline]
    pub fn docstore_path(&self) -> PathBuf {
        self.get_base_dir().join("docstore.db")
    }

    /// Get the path for the persisted index structures
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.get_base_dir().join("index.json")
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        self.ollama_url()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.llm_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.llm_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}

impl IndexConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.max_triplets_per_chunk) {
            return Err(ConfigError::InvalidMaxTriplets(self.max_triplets_per_chunk));
        }

        if !(1..=64).contains(&self.extraction_concurrency) {
            return Err(ConfigError::InvalidConcurrency(self.extraction_concurrency));
        }

        Ok(())
    }
}
