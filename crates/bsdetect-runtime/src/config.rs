//! Runtime configuration.
//!
//! Resolution order (highest priority first):
//! 1. Caller overrides (CLI flags)
//! 2. Environment variables (`BSDETECT_*`)
//! 3. YAML config file
//! 4. Compiled defaults
//!
//! Durations are written in humantime form (`"1s"`, `"500ms"`, `"30s"`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;

pub const ENV_MODEL: &str = "BSDETECT_MODEL";
pub const ENV_MAX_RETRIES: &str = "BSDETECT_MAX_RETRIES";
pub const ENV_BASE_DELAY: &str = "BSDETECT_BASE_DELAY";
pub const ENV_TIMEOUT: &str = "BSDETECT_TIMEOUT";
pub const ENV_TEMPERATURE: &str = "BSDETECT_TEMPERATURE";

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid value in {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },

    #[error("Invalid config for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub completion: CompletionSettings,
    pub retry: RetrySettings,
    pub search: SearchSettings,
    pub memory: MemorySettings,
}

/// LLM call settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub prompt_caching: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        let defaults = CompletionConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: defaults.timeout,
            prompt_caching: defaults.prompt_caching,
        }
    }
}

/// Expert retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Assessments below this confidence count as failures (0 disables)
    pub min_confidence: u8,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            min_confidence: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
    pub max_facts: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 3,
            max_facts: bsdetect_core::evidence::DEFAULT_MAX_FACTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub enabled: bool,
    pub max_related: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_related: bsdetect_core::memory::DEFAULT_MAX_RELATED,
        }
    }
}

impl RuntimeConfig {
    /// Defaults, then the optional file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Self::from_yaml(&content)
    }

    /// Apply `BSDETECT_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(model) = lookup(ENV_MODEL) {
            self.completion.model = model;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = raw.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                var: ENV_MAX_RETRIES,
                message: format!("{}", e),
            })?;
        }
        if let Some(raw) = lookup(ENV_BASE_DELAY) {
            self.retry.base_delay = parse_duration(ENV_BASE_DELAY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.completion.timeout = parse_duration(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TEMPERATURE) {
            self.completion.temperature =
                raw.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                    var: ENV_TEMPERATURE,
                    message: format!("{}", e),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.completion.temperature) {
            return Err(ConfigError::Invalid {
                field: "completion.temperature",
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.completion.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "completion.timeout",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.retry.max_delay < self.retry.base_delay {
            return Err(ConfigError::Invalid {
                field: "retry.max_delay",
                message: "must not be shorter than retry.base_delay".to_string(),
            });
        }
        if self.retry.min_confidence > 100 {
            return Err(ConfigError::Invalid {
                field: "retry.min_confidence",
                message: "must be between 0 and 100".to_string(),
            });
        }
        Ok(())
    }

    /// Per-call settings handed to the provider.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.completion.model.clone(),
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
            timeout: self.completion.timeout,
            prompt_caching: self.completion.prompt_caching,
        }
    }
}

fn parse_duration(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidEnv {
        var,
        message: e.to_string(),
    })
}

/// Serde adapter for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
