use crate::error::ConfigError;
use crate::store::StoreSettings;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Application configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Fixed random seed; entropy seeded when absent
    pub seed: Option<u64>,
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub reports: ReportsConfig,
    /// Where the time aggregator reads observations from
    pub source: SourceConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Observation window lengths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
}

/// Report assignment probabilities and batch size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportsConfig {
    pub problem_report_probability: f64,
    pub investigation_probability: f64,
    pub investigation_batch_size: usize,
}

/// Observation source for the aggregator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Read the store of this process directly
    #[default]
    InProcess,
    /// Fetch from a remote observation service
    Http { endpoint: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let settings = StoreSettings::default();
        Self {
            min_duration_minutes: settings.min_duration_minutes,
            max_duration_minutes: settings.max_duration_minutes,
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        let settings = StoreSettings::default();
        Self {
            problem_report_probability: settings.problem_report_probability,
            investigation_probability: settings.investigation_probability,
            investigation_batch_size: settings.investigation_batch_size,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// `ReadError` if the file cannot be read, `TomlError` if it is not valid
    /// TOML for this schema, `ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        let generation = &self.generation;
        if generation.min_duration_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "generation.min_duration_minutes must be at least 1".to_string(),
            ));
        }
        if generation.min_duration_minutes > generation.max_duration_minutes {
            return Err(ConfigError::ValidationError(format!(
                "generation.min_duration_minutes ({}) exceeds max_duration_minutes ({})",
                generation.min_duration_minutes, generation.max_duration_minutes
            )));
        }

        for (name, value) in [
            (
                "reports.problem_report_probability",
                self.reports.problem_report_probability,
            ),
            (
                "reports.investigation_probability",
                self.reports.investigation_probability,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if self.reports.investigation_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "reports.investigation_batch_size must be at least 1".to_string(),
            ));
        }

        if let SourceConfig::Http { endpoint } = &self.source {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "source.endpoint must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Parsed listener address
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen_addr.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "server.listen_addr '{}' is not a socket address: {}",
                self.server.listen_addr, e
            ))
        })
    }

    /// Store tunables derived from this configuration
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            min_duration_minutes: self.generation.min_duration_minutes,
            max_duration_minutes: self.generation.max_duration_minutes,
            problem_report_probability: self.reports.problem_report_probability,
            investigation_probability: self.reports.investigation_probability,
            investigation_batch_size: self.reports.investigation_batch_size,
        }
    }
}
