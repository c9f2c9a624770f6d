use crate::common::{RequestContext, ResponseWriter};
use crate::config::ExceptionHandlerConfig;
use crate::exception::{
    ErrorException, Exception, ExceptionCategory, ExceptionResponseFactoryRegistry,
    HandlerRegistration, HttpException, Severity, default_response,
};
use crate::exception::layer::request_catches_panics;
use crate::logging::{ErrorContext, ErrorLogger};
use axum::response::Response;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe, Location, PanicHookInfo};
use std::sync::{Arc, PoisonError, RwLock};

/// Turns runtime error signals and exceptions into log entries and HTTP responses.
///
/// Runtime error signals ([`handle_error`](Self::handle_error)) are compared against
/// the configured thresholds: they may be ignored, logged, promoted to an
/// [`ErrorException`], or both logged and promoted.
///
/// Exceptions ([`handle_exception`](Self::handle_exception)) always end in exactly one
/// response handed to the [`ResponseWriter`]:
/// - without a request context, the default 500 JSON response;
/// - an [`HttpException`] sends its own response;
/// - otherwise the factory registered for the exception's exact type, falling back to
///   the default response when there is none or when it fails.
///
/// One handler serves one request at a time. The request middleware builds a
/// request-scoped handler per request (see [`ExceptionHandlerLayer`](crate::ExceptionHandlerLayer)).
pub struct ExceptionHandler {
    logger: Arc<dyn ErrorLogger>,
    factories: Option<Arc<ExceptionResponseFactoryRegistry>>,
    writer: Arc<dyn ResponseWriter>,
    config: Arc<ExceptionHandlerConfig>,
    request_context: RwLock<Option<RequestContext>>,
}

impl ExceptionHandler {
    pub fn new(
        logger: Arc<dyn ErrorLogger>,
        factories: Option<Arc<ExceptionResponseFactoryRegistry>>,
        writer: Arc<dyn ResponseWriter>,
        config: impl Into<Arc<ExceptionHandlerConfig>>,
    ) -> Self {
        Self {
            logger,
            factories,
            writer,
            config: config.into(),
            request_context: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ExceptionHandlerConfig {
        &self.config
    }

    /// Replace the context of the request being handled
    pub fn set_request_context(&self, context: RequestContext) {
        *self
            .request_context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(context);
    }

    pub fn clear_request_context(&self) {
        *self
            .request_context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn request_context(&self) -> Option<RequestContext> {
        self.request_context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle a runtime error signal.
    ///
    /// Logs it when `severity` reaches the logged threshold. When it reaches the thrown
    /// threshold it is returned as an [`ErrorException`] for the caller to propagate;
    /// no response is built here.
    ///
    /// # Errors
    /// Returns the promoted [`ErrorException`] when `severity` reaches the thrown threshold.
    pub fn handle_error(
        &self,
        severity: Severity,
        message: &str,
        file: &str,
        line: u32,
        context: &ErrorContext,
    ) -> Result<(), ErrorException> {
        if self.config.should_log(severity) {
            self.logger.log(severity, message, context);
        }

        if self.config.should_throw(severity) {
            return Err(ErrorException::new(severity, message, file, line));
        }

        Ok(())
    }

    /// [`handle_error`](Self::handle_error) with the caller's file and line
    ///
    /// # Errors
    /// See [`handle_error`](Self::handle_error).
    #[track_caller]
    pub fn report(
        &self,
        severity: Severity,
        message: &str,
        context: &ErrorContext,
    ) -> Result<(), ErrorException> {
        let location = Location::caller();
        self.handle_error(severity, message, location.file(), location.line(), context)
    }

    /// Log `exception` unless its type is exempt, then write a response for it.
    pub fn handle_exception(&self, exception: Box<dyn Exception>) {
        if self.config.should_log_exception(&exception.category()) {
            self.logger.error(exception.as_ref());
        }

        let response = self.build_response(exception);
        self.writer.write_response(response);
    }

    /// Install this handler as the process panic hook.
    ///
    /// Panics are logged as [`Severity::Fatal`] signals, subject to the logged
    /// threshold. Panics inside a request running under
    /// [`ExceptionHandlerLayer`](crate::ExceptionHandlerLayer) are left to the layer,
    /// which handles them as [`PanicException`](crate::PanicException)s. Dropping the returned registration restores the previous hook.
    pub fn register(self: &Arc<Self>) -> HandlerRegistration {
        HandlerRegistration::install(Arc::clone(self))
    }

    pub(crate) fn handle_panic(&self, info: &PanicHookInfo<'_>) {
        // The request middleware reports these itself.
        if request_catches_panics() || !self.config.should_log(Severity::Fatal) {
            return;
        }

        let message = panic_message(info.payload());
        let mut context = ErrorContext::new();
        if let Some(location) = info.location() {
            context.insert("file".into(), location.file().into());
            context.insert("line".into(), location.line().into());
        }
        if let Some(request) = self.request_context() {
            context.insert("request_id".into(), request.request_id().to_string().into());
        }

        self.logger.log(Severity::Fatal, &message, &context);
    }

    fn build_response(&self, exception: Box<dyn Exception>) -> Response {
        let Some(context) = self.request_context() else {
            return default_response();
        };

        let category = exception.category();
        if category == ExceptionCategory::of::<HttpException>() {
            return match exception.into_any().downcast::<HttpException>() {
                Ok(http) => http.into_response(),
                Err(_) => default_response(),
            };
        }

        let Some(factory) = self
            .factories
            .as_deref()
            .and_then(|factories| factories.get_factory(&category))
        else {
            return default_response();
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            factory.build_response(exception.as_ref(), &context)
        }));

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(%category, error = %e, "Exception response factory failed, sending default response");
                default_response()
            }
            Err(payload) => {
                tracing::warn!(
                    %category,
                    panic = %panic_message(payload.as_ref()),
                    "Exception response factory panicked, sending default response"
                );
                default_response()
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
