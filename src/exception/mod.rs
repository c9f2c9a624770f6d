//! Exception handling
//!
//! Any concrete error type can travel through the handler as an [`Exception`].
//! Its [`ExceptionCategory`] (the concrete type) selects a response factory from the
//! [`ExceptionResponseFactoryRegistry`]; lookups are exact-type only.

use axum::response::{IntoResponse, Response};
use std::any::{Any, TypeId};
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

mod handler;
pub mod http;
mod layer;
mod registration;
mod registry;
mod severity;

pub use handler::ExceptionHandler;
pub use http::{HttpException, default_response};
pub use layer::{ExceptionHandlerLayer, ExceptionHandlerMiddleware, PanicException, ServiceError};
pub use registration::HandlerRegistration;
pub use registry::{
    CategoryMismatch, ExceptionResponseFactory, ExceptionResponseFactoryRegistry,
};
pub use severity::{ErrorException, Severity};

/// An error travelling through the exception handler.
///
/// Implemented for every `Error + Send + Sync + 'static` type.
pub trait Exception: Error + Send + Sync + 'static {
    /// The concrete type of this exception
    fn category(&self) -> ExceptionCategory;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<E> Exception for E
where
    E: Error + Send + Sync + 'static,
{
    fn category(&self) -> ExceptionCategory {
        ExceptionCategory::of::<E>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Identifies an exception by its concrete type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for logs.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionCategory {
    id: TypeId,
    name: &'static str,
}

impl ExceptionCategory {
    pub fn of<E: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ExceptionCategory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExceptionCategory {}

impl Hash for ExceptionCategory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ExceptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Error type for route handlers.
///
/// Any error converts into `Thrown` with `?`. Turned into a response, it yields the
/// default 500 response and carries the exception along so that
/// [`ExceptionHandlerLayer`] can hand it to the request's [`ExceptionHandler`].
///
/// ```
/// use catchall::{HttpException, Thrown};
/// use axum::http::StatusCode;
///
/// async fn find_order(id: u64) -> Result<String, Thrown> {
///     if id == 0 {
///         return Err(HttpException::with_status(StatusCode::NOT_FOUND, "No such order").into());
///     }
///     let total: u32 = "42".parse()?;
///     Ok(format!("order {id}: {total}"))
/// }
/// ```
pub struct Thrown(Box<dyn Exception>);

impl Thrown {
    pub fn exception(&self) -> &dyn Exception {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn Exception> {
        self.0
    }
}

impl<E> From<E> for Thrown
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self(Box::new(error))
    }
}

impl From<Box<dyn Exception>> for Thrown {
    fn from(exception: Box<dyn Exception>) -> Self {
        Self(exception)
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Thrown").field(&self.0).finish()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl IntoResponse for Thrown {
    fn into_response(self) -> Response {
        let mut response = default_response();
        response
            .extensions_mut()
            .insert(PendingException::new(self.0));
        response
    }
}

/// Response extension carrying a thrown exception to the middleware.
#[derive(Clone)]
pub(crate) struct PendingException(Arc<Mutex<Option<Box<dyn Exception>>>>);

impl PendingException {
    fn new(exception: Box<dyn Exception>) -> Self {
        Self(Arc::new(Mutex::new(Some(exception))))
    }

    pub(crate) fn take(&self) -> Option<Box<dyn Exception>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::num::ParseIntError;

    #[derive(Debug, thiserror::Error)]
    #[error("order {0} not found")]
    struct OrderNotFound(u64);

    #[test]
    fn test_category_is_the_concrete_type() {
        let exception: Box<dyn Exception> = Box::new(OrderNotFound(1));

        assert_eq!(exception.category(), ExceptionCategory::of::<OrderNotFound>());
        assert_ne!(exception.category(), ExceptionCategory::of::<ParseIntError>());
        assert!(exception.category().name().ends_with("OrderNotFound"));
    }

    #[test]
    fn test_downcasts_back_to_concrete_type() {
        let exception: Box<dyn Exception> = Box::new(OrderNotFound(9));

        assert_eq!(
            exception.as_any().downcast_ref::<OrderNotFound>().unwrap().0,
            9
        );
        assert_eq!(exception.into_any().downcast::<OrderNotFound>().unwrap().0, 9);
    }

    #[test]
    fn test_thrown_into_response_carries_exception() {
        let thrown = Thrown::from(OrderNotFound(3));
        assert_eq!(thrown.to_string(), "order 3 not found");

        let response = thrown.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let pending = response.extensions().get::<PendingException>().unwrap();
        let exception = pending.take().unwrap();
        assert_eq!(exception.category(), ExceptionCategory::of::<OrderNotFound>());
        assert!(pending.take().is_none());
    }
}
