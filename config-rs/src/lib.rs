//! config-rs/lib.rs
//! Shared configuration for the query guard pipeline.
//! Values come from (in order) built-in defaults, a TOML file and
//! environment variable overrides.

mod sections;

pub use sections::{
    LoggingConfig, RouterConfig, SanitizerConfig, SqlValidatorConfig, ThreatPatternConfig,
    DEFAULT_KNOWN_TABLES,
};

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "QUERY_GUARD_CONFIG_PATH";

/// Configuration file used when `QUERY_GUARD_CONFIG_PATH` is not set
pub const DEFAULT_CONFIG_PATH: &str = "./config/query_guard.toml";

pub const SECURITY_LEVELS: &[&str] = &["STRICT", "MODERATE", "PERMISSIVE"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub sanitizer: SanitizerConfig,
    pub sql_validator: SqlValidatorConfig,
    pub router: RouterConfig,
    pub logging: LoggingConfig,
}

impl GuardConfig {
    /// Load configuration from `.env`, the configured TOML file and the
    /// environment. A missing file is not an error: defaults are used.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside development
        dotenv::dotenv().ok();

        let config_path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = match Self::load_from_path(&config_path) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(path)) => {
                debug!(path = %path, "No configuration file, using defaults");
                Self::default()
            }
            Err(err) => return Err(err),
        };

        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text; absent keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply `QUERY_GUARD_*` overrides obtained through `lookup`.
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("QUERY_GUARD_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(level) = lookup("QUERY_GUARD_SECURITY_LEVEL") {
            self.sql_validator.default_security_level = level.to_uppercase();
        }
        if let Some(threshold) = parse_override(&lookup, "QUERY_GUARD_FAILURE_THRESHOLD") {
            self.router.failure_threshold = threshold;
        }
        if let Some(length) = parse_override(&lookup, "QUERY_GUARD_MAX_QUERY_LENGTH") {
            self.router.max_query_length = length;
        }
        if let Some(secs) = parse_override::<u64, _>(&lookup, "QUERY_GUARD_RECOVERY_TIMEOUT_SECS") {
            // 0 disables timed recovery
            self.router.recovery_timeout_secs = if secs == 0 { None } else { Some(secs) };
        }
    }

    /// Reject values that would make a stage misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sanitizer;
        if s.truncate_length < 4 {
            return Err(ConfigError::InvalidValue(format!(
                "sanitizer.truncate_length must be at least 4, got {}",
                s.truncate_length
            )));
        }
        for (name, value) in [
            ("sanitizer.min_confidence", s.min_confidence),
            ("sanitizer.generation_min_confidence", s.generation_min_confidence),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be within 0..=100, got {}",
                    name, value
                )));
            }
        }

        let level = self.sql_validator.default_security_level.to_uppercase();
        if !SECURITY_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "sql_validator.default_security_level must be one of {:?}, got '{}'",
                SECURITY_LEVELS, self.sql_validator.default_security_level
            )));
        }

        let r = &self.router;
        if r.failure_threshold == 0 || r.breaker_window == 0 {
            return Err(ConfigError::InvalidValue(
                "router.failure_threshold and router.breaker_window must be positive".to_string(),
            ));
        }
        if r.failure_threshold > r.breaker_window {
            return Err(ConfigError::InvalidValue(format!(
                "router.failure_threshold ({}) cannot exceed router.breaker_window ({})",
                r.failure_threshold, r.breaker_window
            )));
        }
        if r.history_window == 0 || r.max_history < r.breaker_window.max(r.history_window) {
            return Err(ConfigError::InvalidValue(format!(
                "router.max_history ({}) must hold at least one breaker and history window",
                r.max_history
            )));
        }
        for (name, value) in [
            ("router.default_historical_score", r.default_historical_score),
            ("router.llm_confidence_threshold", r.llm_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be within 0..=1, got {}",
                    name, value
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "logging.level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

fn parse_override<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Invalid override, keeping configured value");
            None
        }
    }
}
