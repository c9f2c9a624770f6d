use crate::exception::{ExceptionCategory, Severity};
use dashmap::DashMap;
use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Minimum severity that gets logged (`off` disables logging of runtime errors)
pub const LOG_LEVEL_KEY: &str = "EXCEPTIONS_LOG_LEVEL";
/// Minimum severity that gets promoted to an [`ErrorException`](crate::ErrorException)
pub const THROW_LEVEL_KEY: &str = "EXCEPTIONS_THROW_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid severity '{value}' for {key}")]
    InvalidSeverity { key: String, value: String },
}

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Thresholds and exemptions of an [`ExceptionHandler`](crate::ExceptionHandler).
///
/// An unset threshold means "never". A severity passes a threshold when it is at
/// least as severe.
#[derive(Debug, Clone, Default)]
pub struct ExceptionHandlerConfig {
    logged_threshold: Option<Severity>,
    thrown_threshold: Option<Severity>,
    not_logged: HashSet<ExceptionCategory>,
}

impl ExceptionHandlerConfig {
    /// Never log or throw runtime errors; log every exception
    pub fn new() -> Self {
        Self::default()
    }

    /// Read thresholds from [`LOG_LEVEL_KEY`] and [`THROW_LEVEL_KEY`]
    ///
    /// # Errors
    /// Fails if a value is neither a severity name nor `off`/`none`.
    pub fn from_config(config: &ConfigService) -> Result<Self, ConfigError> {
        Ok(Self {
            logged_threshold: threshold(config, LOG_LEVEL_KEY)?,
            thrown_threshold: threshold(config, THROW_LEVEL_KEY)?,
            not_logged: HashSet::new(),
        })
    }

    pub fn log_from(mut self, severity: Severity) -> Self {
        self.logged_threshold = Some(severity);
        self
    }

    pub fn throw_from(mut self, severity: Severity) -> Self {
        self.thrown_threshold = Some(severity);
        self
    }

    /// Never log exceptions of type `E`
    pub fn dont_log<E: 'static>(self) -> Self {
        self.dont_log_category(ExceptionCategory::of::<E>())
    }

    pub fn dont_log_category(mut self, category: ExceptionCategory) -> Self {
        self.not_logged.insert(category);
        self
    }

    pub fn logged_threshold(&self) -> Option<Severity> {
        self.logged_threshold
    }

    pub fn thrown_threshold(&self) -> Option<Severity> {
        self.thrown_threshold
    }

    pub fn should_log(&self, severity: Severity) -> bool {
        self.logged_threshold.is_some_and(|min| severity >= min)
    }

    pub fn should_throw(&self, severity: Severity) -> bool {
        self.thrown_threshold.is_some_and(|min| severity >= min)
    }

    pub fn should_log_exception(&self, category: &ExceptionCategory) -> bool {
        !self.not_logged.contains(category)
    }
}

fn threshold(config: &ConfigService, key: &str) -> Result<Option<Severity>, ConfigError> {
    let Some(raw) = config.get(key) else {
        return Ok(None);
    };

    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    Severity::from_str(value)
        .map(Some)
        .map_err(|_| ConfigError::InvalidSeverity {
            key: key.to_string(),
            value: raw,
        })
}
