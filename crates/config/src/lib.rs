//! # Benchpilot Config
//!
//! Layered configuration: built-in defaults, an optional TOML file, then
//! environment variable overrides (`BENCHPILOT_*`). Every section has
//! sensible defaults, so an empty file and no file at all both work.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use benchpilot_guard::GuardLimits;
use benchpilot_session::SessionSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Model and turn-loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model identifier passed to the provider.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens per completion.
    pub max_tokens: u32,

    /// Maximum provider round-trips per user turn.
    pub max_turns: u32,

    /// Extra system prompt text prepended before the phase guidance.
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "qwen-plus".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            max_turns: 10,
            system_prompt: None,
        }
    }
}

/// Session lifecycle settings plus the optional persistence directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle seconds after which a session expires.
    pub expiration_secs: i64,

    /// Maximum live sessions.
    pub capacity: usize,

    /// Directory for persisted workflow contexts. None disables persistence.
    pub state_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let defaults = SessionSettings::default();
        Self {
            expiration_secs: defaults.expiration_secs,
            capacity: defaults.capacity,
            state_dir: None,
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            expiration_secs: self.expiration_secs,
            capacity: self.capacity,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentSettings,
    pub guard: GuardLimits,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        debug!(path = %path.display(), "loaded configuration file");
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides; no file involved.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("BENCHPILOT_MODEL") {
            self.agent.model = model;
        }
        if let Ok(temp) = std::env::var("BENCHPILOT_TEMPERATURE") {
            if let Ok(temp) = temp.parse() {
                self.agent.temperature = temp;
            }
        }
        if let Ok(turns) = std::env::var("BENCHPILOT_MAX_TURNS") {
            if let Ok(turns) = turns.parse() {
                self.agent.max_turns = turns;
            }
        }
        if let Ok(dir) = std::env::var("BENCHPILOT_STATE_DIR") {
            self.session.state_dir = Some(PathBuf::from(dir));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.model.is_empty() {
            return Err(ConfigError::Invalid("agent.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::Invalid(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_turns == 0 {
            return Err(ConfigError::Invalid("agent.max_turns must be at least 1".into()));
        }
        if self.session.capacity == 0 {
            return Err(ConfigError::Invalid(
                "session.capacity must be at least 1".into(),
            ));
        }
        if self.guard.max_total == 0 || self.guard.max_per_tool == 0 {
            return Err(ConfigError::Invalid(
                "guard limits must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.model, "qwen-plus");
        assert_eq!(config.guard.max_total, 15);
        assert_eq!(config.session.capacity, 100);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[agent]\nmodel = \"qwen-max\"\n\n[guard]\nmax_total = 25"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.agent.model, "qwen-max");
        assert_eq!(config.guard.max_total, 25);
        assert_eq!(config.guard.max_per_tool, 5);
        assert_eq!(config.agent.max_turns, 10);
    }

    #[test]
    fn invalid_temperature_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\ntemperature = 9.0").unwrap();
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            AppConfig::load("/nonexistent/benchpilot.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn session_config_converts_to_settings() {
        let config = SessionConfig {
            expiration_secs: 60,
            capacity: 5,
            state_dir: None,
        };
        let settings = config.settings();
        assert_eq!(settings.expiration_secs, 60);
        assert_eq!(settings.capacity, 5);
    }
}
