//! Configuration management
//!
//! This module handles loading, validation, and management of the Bow configuration.
//! Configuration is stored in TOML format at ~/.bow/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **actuation**: Stick scale and frame interval of the actuation codec
//! - **executor**: `DoUntil` polling and the per-execution step bound
//! - **feedback**: Speech command and the default prompt
//!
//! Every section except `core` may be omitted and falls back to defaults.
//!
//! # Examples
//!
//! ```no_run
//! use bow_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Plans live in {:?}", config.plans_dir());
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Actuation codec settings
    #[serde(default)]
    pub actuation: ActuationConfig,

    /// Executor settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// User feedback settings
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Actuation codec configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuationConfig {
    /// Analog stick magnitude per unit of velocity
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Duration of one motion frame in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

/// Executor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Pause between `DoUntil` repetitions in milliseconds (0 only yields)
    #[serde(default)]
    pub until_poll_ms: u64,

    /// Maximum nodes visited per execution (0 is unlimited)
    #[serde(default)]
    pub max_steps: usize,
}

/// Feedback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Command used to speak feedback, e.g. "say -v Junior"
    #[serde(default)]
    pub speech_command: Option<String>,

    /// Prompt appended after reports
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            speech_command: None,
            prompt: default_prompt(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.bow")
}

fn default_scale() -> f64 {
    10000.0
}

fn default_frame_interval_ms() -> u64 {
    1000
}

fn default_prompt() -> String {
    "What should I do next?".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            actuation: ActuationConfig::default(),
            executor: ExecutorConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.bow/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.bow/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".bow").join("config.toml"))
    }

    /// Directory holding saved plans
    pub fn plans_dir(&self) -> PathBuf {
        self.core.data_dir.join("plans")
    }

    /// Validate and process configuration
    ///
    /// Checks the log level and numeric ranges, expands ~ in the data
    /// directory and creates it if missing.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !(self.actuation.scale.is_finite() && self.actuation.scale > 0.0) {
            return Err(EngineError::Config(format!(
                "actuation.scale must be positive, got {}",
                self.actuation.scale
            )));
        }

        if let Some(command) = &self.feedback.speech_command {
            if command.trim().is_empty() {
                self.feedback.speech_command = None;
            }
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.actuation.scale, 10000.0);
        assert_eq!(config.actuation.frame_interval_ms, 1000);
        assert_eq!(config.executor.max_steps, 0);
        assert_eq!(config.feedback.prompt, "What should I do next?");
        assert!(config.feedback.speech_command.is_none());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_plans_dir() {
        let mut config = Config::default();
        config.core.data_dir = PathBuf::from("/var/lib/bow");
        assert_eq!(config.plans_dir(), PathBuf::from("/var/lib/bow/plans"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.actuation.scale, deserialized.actuation.scale);
        assert_eq!(config.feedback.prompt, deserialized.feedback.prompt);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.core.log_level = "loud".to_string();
        let err = config.validate_and_process().unwrap_err();
        assert!(matches!(err, EngineError::Config(msg) if msg.contains("loud")));
    }

    #[test]
    fn test_non_positive_scale() {
        let mut config = Config::default();
        config.actuation.scale = 0.0;
        assert!(matches!(
            config.validate_and_process(),
            Err(EngineError::Config(_))
        ));
    }
}
