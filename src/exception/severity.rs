use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Severity of a runtime error signal, from least to most severe.
///
/// Parses case-insensitively from its lowercase name (`"warning"`, `"Fatal"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Deprecated,
    Notice,
    Warning,
    Error,
    Fatal,
}

/// A runtime error signal promoted to an error value.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ErrorException {
    severity: Severity,
    message: String,
    file: String,
    line: u32,
}

impl ErrorException {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severities_are_ordered() {
        assert!(Severity::Deprecated < Severity::Notice);
        assert!(Severity::Notice < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_parses_names_case_insensitively() {
        assert_eq!(Severity::from_str("warning").unwrap(), Severity::Warning);
        assert_eq!(Severity::from_str("FATAL").unwrap(), Severity::Fatal);
        assert!(Severity::from_str("panic").is_err());
        assert_eq!(Severity::Notice.to_string(), "notice");
    }
}
