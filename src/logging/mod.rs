//! Error logging
//!
//! The exception handler writes through an [`ErrorLogger`]. [`TracingLogger`] forwards
//! everything to `tracing`, so the application's subscriber decides where it ends up.

use crate::exception::{Exception, Severity};

/// Structured context attached to a runtime error signal.
pub type ErrorContext = serde_json::Map<String, serde_json::Value>;

/// Sink for the exception handler's log entries
pub trait ErrorLogger: Send + Sync {
    /// Log a runtime error signal at its own severity
    fn log(&self, severity: Severity, message: &str, context: &ErrorContext);

    /// Log an exception at error level
    fn error(&self, exception: &dyn Exception);
}

/// An [`ErrorLogger`] that emits `tracing` events
///
/// Deprecations go to `debug`, notices to `info`, warnings to `warn`, and errors
/// and fatal signals to `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ErrorLogger for TracingLogger {
    fn log(&self, severity: Severity, message: &str, context: &ErrorContext) {
        let context = serde_json::Value::Object(context.clone());

        match severity {
            Severity::Deprecated => tracing::debug!(%severity, %context, "{}", message),
            Severity::Notice => tracing::info!(%severity, %context, "{}", message),
            Severity::Warning => tracing::warn!(%severity, %context, "{}", message),
            Severity::Error | Severity::Fatal => {
                tracing::error!(%severity, %context, "{}", message)
            }
        }
    }

    fn error(&self, exception: &dyn Exception) {
        let mut causes = Vec::new();
        let mut source = exception.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        tracing::error!(
            category = %exception.category(),
            causes = ?causes,
            "{}",
            exception
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::DependencyResolutionError;
    use crate::error::ContainerError;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        captured.lines()
    }

    #[test]
    fn test_severities_map_to_tracing_levels() {
        let lines = capture(|| {
            let mut context = ErrorContext::new();
            context.insert("user".into(), "alice".into());

            for severity in [
                Severity::Deprecated,
                Severity::Notice,
                Severity::Warning,
                Severity::Error,
                Severity::Fatal,
            ] {
                TracingLogger.log(severity, "disk almost full", &context);
            }
        });

        let levels: Vec<&str> = lines
            .iter()
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(levels, ["DEBUG", "INFO", "WARN", "ERROR", "ERROR"]);

        assert!(lines.iter().all(|line| line.contains("disk almost full")));
        assert!(lines[0].contains("severity=deprecated"));
        assert!(lines[4].contains("severity=fatal"));
        assert!(lines[2].contains(r#"context={"user":"alice"}"#));
    }

    #[test]
    fn test_exception_logs_cause_chain() {
        let lines = capture(|| {
            let exception = DependencyResolutionError::new(
                "Mailer",
                ContainerError::Internal("registry offline".into()),
            );
            TracingLogger.error(&exception);
        });

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.starts_with("ERROR"));
        assert!(line.contains("Could not resolve dependencies for Mailer"));
        assert!(line.contains(r#"causes=["Internal error: registry offline"]"#));
        assert!(line.contains("category="));
    }
}
