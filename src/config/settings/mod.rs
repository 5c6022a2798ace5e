
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::scoring::{ThresholdBand, ThresholdTable, default_bands};

/// Candidate models tried in order until one is installed on the server.
pub const DEFAULT_MODEL_CHAIN: [&str; 3] =
    ["allenai/specter2", "all-mpnet-base-v2", "all-MiniLM-L6-v2"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub models: Vec<String>,
    pub thresholds: Vec<ThresholdBand>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODEL_CHAIN.map(str::to_string).to_vec(),
            thresholds: default_bands(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub context_file: PathBuf,
    pub papers_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            context_file: PathBuf::from("research_context.txt"),
            papers_dir: PathBuf::from("papers"),
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
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("No embedding models configured")]
    NoModelsConfigured,
    #[error("Invalid relevance thresholds: {0}")]
    InvalidThresholds(String),
    #[error("Invalid context file path (cannot be empty)")]
    InvalidContextFile,
    #[error("Invalid papers directory path (cannot be empty)")]
    InvalidPapersDir,
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
            server: ServerConfig::default(),
            scoring: ScoringConfig::default(),
            storage: StorageConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".paper-triage"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("paper-triage"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
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

    /// Load from the platform config directory.
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = Self::config_dir().context("Failed to determine config directory")?;
        Self::load(config_dir)
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

        let config_path = self.config_file_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.scoring.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_base_dir().join("config.toml"))
    }

    /// Path of the research context file, resolved against the base
    /// directory when configured relative.
    #[inline]
    pub fn context_file_path(&self) -> PathBuf {
        self.resolve_path(&self.storage.context_file)
    }

    /// Directory downloaded PDFs are written into.
    #[inline]
    pub fn papers_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.storage.papers_dir)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        Ok(())
    }

    /// Base URL of the embedding server.
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = ServerConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModelsConfigured);
        }

        for model in &self.models {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidModel(model.clone()));
            }
        }

        self.threshold_table().map(|_| ())
    }

    /// Builds the validated threshold table configured here.
    pub fn threshold_table(&self) -> Result<ThresholdTable, ConfigError> {
        ThresholdTable::new(self.thresholds.clone())
            .map_err(|e| ConfigError::InvalidThresholds(e.to_string()))
    }

    pub fn set_models(&mut self, models: Vec<String>) -> Result<(), ConfigError> {
        if models.is_empty() {
            return Err(ConfigError::NoModelsConfigured);
        }
        for model in &models {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidModel(model.clone()));
            }
        }
        self.models = models;
        Ok(())
    }

    /// Move a model to the head of the candidate chain, inserting it when it
    /// is not already configured. Used after a model switch so the chosen
    /// model is tried first on the next startup.
    pub fn promote_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.models.retain(|m| m != &model);
        self.models.insert(0, model);
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidContextFile);
        }
        if self.papers_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidPapersDir);
        }
        Ok(())
    }

    pub fn set_context_file(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidContextFile);
        }
        self.context_file = path;
        Ok(())
    }

    pub fn set_papers_dir(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidPapersDir);
        }
        self.papers_dir = path;
        Ok(())
    }
}
