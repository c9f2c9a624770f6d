use crate::common::{RequestContext, ResponseSlot};
use crate::config::ExceptionHandlerConfig;
use crate::error::BoxError;
use crate::exception::handler::panic_message;
use crate::exception::{
    Exception, ExceptionHandler, ExceptionResponseFactoryRegistry, PendingException,
    default_response,
};
use crate::logging::ErrorLogger;
use axum::{body::Body, http::Request, response::Response};
use futures_util::FutureExt;
use std::any::Any;
use std::cell::Cell;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tower::{Layer, Service, ServiceExt};

/// The wrapped service failed instead of producing a response.
#[derive(Debug, Error)]
#[error("inner service failed: {source}")]
pub struct ServiceError {
    #[source]
    source: BoxError,
}

impl ServiceError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A route handler panicked while producing a response.
#[derive(Debug, Error)]
#[error("request handler panicked: {message}")]
pub struct PanicException {
    message: String,
}

impl PanicException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self::new(panic_message(payload))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

thread_local! {
    static CATCHING_PANICS: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is polling a request whose panics the middleware catches.
///
/// The registered panic hook checks this so such a panic is logged once, as a
/// [`PanicException`], instead of also as a fatal signal.
pub(crate) fn request_catches_panics() -> bool {
    CATCHING_PANICS.with(Cell::get)
}

/// Marks the current thread for the duration of one poll.
struct CatchScope {
    previous: bool,
}

impl CatchScope {
    fn enter() -> Self {
        Self {
            previous: CATCHING_PANICS.replace(true),
        }
    }
}

impl Drop for CatchScope {
    fn drop(&mut self) {
        CATCHING_PANICS.set(self.previous);
    }
}

/// Tower layer running every request under its own [`ExceptionHandler`].
///
/// For each request the middleware builds a handler sharing this layer's logger,
/// factories and configuration, sets its [`RequestContext`], and exposes both through
/// request extensions (`Extension<Arc<ExceptionHandler>>`, `Extension<RequestContext>`).
/// A [`Thrown`](crate::Thrown) error, a failure of the inner service, or a panic is
/// passed to [`ExceptionHandler::handle_exception`] and the response it writes is sent
/// instead. The middleware itself never fails.
///
/// # Example
/// ```
/// use catchall::{ExceptionHandlerConfig, ExceptionHandlerLayer, TracingLogger};
/// use axum::{Router, routing::get};
/// use std::sync::Arc;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(ExceptionHandlerLayer::new(
///         Arc::new(TracingLogger),
///         None,
///         ExceptionHandlerConfig::new(),
///     ));
/// ```
#[derive(Clone)]
pub struct ExceptionHandlerLayer {
    logger: Arc<dyn ErrorLogger>,
    factories: Option<Arc<ExceptionResponseFactoryRegistry>>,
    config: Arc<ExceptionHandlerConfig>,
}

impl ExceptionHandlerLayer {
    pub fn new(
        logger: Arc<dyn ErrorLogger>,
        factories: Option<Arc<ExceptionResponseFactoryRegistry>>,
        config: impl Into<Arc<ExceptionHandlerConfig>>,
    ) -> Self {
        Self {
            logger,
            factories,
            config: config.into(),
        }
    }
}

impl<S> Layer<S> for ExceptionHandlerLayer {
    type Service = ExceptionHandlerMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionHandlerMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExceptionHandlerMiddleware<S> {
    inner: S,
    layer: ExceptionHandlerLayer,
}

impl<S> ExceptionHandlerMiddleware<S> {
    fn request_handler(&self, writer: ResponseSlot) -> ExceptionHandler {
        ExceptionHandler::new(
            Arc::clone(&self.layer.logger),
            self.layer.factories.clone(),
            Arc::new(writer),
            Arc::clone(&self.layer.config),
        )
    }
}

impl<S> Service<Request<Body>> for ExceptionHandlerMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited in `call`, so its errors become responses too.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let slot = ResponseSlot::new();
        let handler = Arc::new(self.request_handler(slot.clone()));

        let context = RequestContext::from_request(&request);
        handler.set_request_context(context.clone());
        request.extensions_mut().insert(context);
        request.extensions_mut().insert(Arc::clone(&handler));

        let inner = self.inner.clone();

        Box::pin(async move {
            let mut call = Box::pin(
                inner
                    .oneshot(request)
                    .map(|result| result.map_err(Into::<BoxError>::into)),
            );
            let guarded = futures_util::future::poll_fn(move |cx| {
                let _scope = CatchScope::enter();
                call.as_mut().poll(cx)
            });
            let outcome = AssertUnwindSafe(guarded).catch_unwind().await;

            let exception: Box<dyn Exception> = match outcome {
                Ok(Ok(mut response)) => {
                    let pending = response
                        .extensions_mut()
                        .remove::<PendingException>()
                        .and_then(|pending| pending.take());
                    match pending {
                        Some(exception) => exception,
                        None => return Ok(response),
                    }
                }
                Ok(Err(error)) => Box::new(ServiceError::new(error)),
                Err(payload) => Box::new(PanicException::from_payload(payload.as_ref())),
            };

            handler.handle_exception(exception);
            Ok(slot.take().unwrap_or_else(default_response))
        })
    }
}
