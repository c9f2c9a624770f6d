//! # Catchall
//!
//! Dependency resolution and exception-to-response handling for axum applications.
//!
//! Catchall provides two pieces of a web application's request lifecycle:
//!
//! - **Dependency resolution**: a thread-safe DI container and a resolver adapter that
//!   reports every container failure as a single [`DependencyResolutionError`].
//! - **Exception handling**: an [`ExceptionHandler`] that logs runtime errors and
//!   exceptions, and turns exceptions into HTTP responses through a registry of
//!   per-type response factories, falling back to a generic 500 JSON response.
//!
//! ## Features
//!
//! - **Guaranteed responses**: a failing or panicking response factory never escapes
//!   the handler; the client gets the default response instead
//! - **Severity thresholds**: runtime error signals are logged and/or promoted to
//!   [`ErrorException`] independently
//! - **Request-scoped handlers**: [`ExceptionHandlerLayer`] runs each request under its
//!   own handler, so request contexts are never shared between requests
//! - **Reversible registration**: [`ExceptionHandler::register`] installs the handler as
//!   the panic hook until the returned guard is dropped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catchall::prelude::*;
//! use catchall::{ContainerDependencyResolver, HasResolver, Inject};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("user {0} not found")]
//! struct UserNotFound(u64);
//!
//! struct UserService;
//!
//! impl UserService {
//!     fn find(&self, id: u64) -> Result<String, UserNotFound> {
//!         Err(UserNotFound(id))
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct AppState {
//!     resolver: ContainerDependencyResolver,
//! }
//!
//! impl HasResolver for AppState {
//!     fn resolver(&self) -> &ContainerDependencyResolver {
//!         &self.resolver
//!     }
//! }
//!
//! async fn get_user(
//!     Inject(users): Inject<UserService>,
//!     Path(id): Path<u64>,
//! ) -> Result<String, Thrown> {
//!     Ok(users.find(id)?)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Register services
//!     let container = ContainerBuilder::new().register(UserService).build();
//!
//!     // 2. Map exceptions to responses
//!     let mut factories = ExceptionResponseFactoryRegistry::new();
//!     factories.register_factory(|e: &UserNotFound, _ctx| {
//!         Ok((StatusCode::NOT_FOUND, e.to_string()).into_response())
//!     });
//!
//!     // 3. Route through the exception handler
//!     let app: Router = Router::new()
//!         .route("/users/{id}", axum::routing::get(get_user))
//!         .layer(ExceptionHandlerLayer::new(
//!             Arc::new(TracingLogger),
//!             Some(Arc::new(factories)),
//!             ExceptionHandlerConfig::new().log_from(Severity::Warning),
//!         ))
//!         .with_state(AppState {
//!             resolver: ContainerDependencyResolver::new(Arc::new(container)),
//!         });
//!
//!     // Serve your app...
//! #   let _ = app;
//! }
//! ```

pub mod common;
pub mod config;
pub mod di;
pub mod error;
pub mod exception;
pub mod logging;

// Re-export core types
pub use common::{ErrorBody, RequestContext, ResponseSlot, ResponseWriter};
pub use config::{ConfigError, ConfigService, ExceptionHandlerConfig};
pub use di::{
    Container, ContainerBuilder, ContainerDependencyResolver, DependencyResolutionError,
    DependencyResolver, HasResolver, Inject, Injectable,
};
pub use error::{BoxError, ContainerError, Result};
pub use exception::{
    ErrorException, Exception, ExceptionCategory, ExceptionHandler, ExceptionHandlerLayer,
    ExceptionResponseFactory, ExceptionResponseFactoryRegistry, HandlerRegistration,
    HttpException, PanicException, ServiceError, Severity, Thrown, default_response,
};
pub use logging::{ErrorContext, ErrorLogger, TracingLogger};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use catchall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{RequestContext, ResponseWriter};
    pub use crate::config::ExceptionHandlerConfig;
    pub use crate::di::{Container, ContainerBuilder, Injectable};
    pub use crate::exception::{
        ExceptionHandler, ExceptionHandlerLayer, ExceptionResponseFactoryRegistry,
        HttpException, Severity, Thrown,
    };
    pub use crate::logging::{ErrorContext, ErrorLogger, TracingLogger};
    pub use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
