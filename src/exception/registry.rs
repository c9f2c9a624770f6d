use crate::common::RequestContext;
use crate::error::BoxError;
use crate::exception::{Exception, ExceptionCategory};
use axum::response::Response;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Builds the response for one exception category.
pub trait ExceptionResponseFactory: Send + Sync {
    /// # Errors
    /// A failed build makes the handler fall back to the default response.
    fn build_response(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<Response, BoxError>;
}

/// A factory was handed an exception of a category it was not registered for.
#[derive(Debug, Error)]
#[error("factory for {expected} cannot build a response for {found}")]
pub struct CategoryMismatch {
    pub expected: ExceptionCategory,
    pub found: ExceptionCategory,
}

/// Adapts a closure over a concrete error type to [`ExceptionResponseFactory`].
struct TypedFactory<E, F> {
    factory: F,
    _exception: PhantomData<fn(&E)>,
}

impl<E, F> ExceptionResponseFactory for TypedFactory<E, F>
where
    E: Error + Send + Sync + 'static,
    F: Fn(&E, &RequestContext) -> Result<Response, BoxError> + Send + Sync,
{
    fn build_response(
        &self,
        exception: &dyn Exception,
        context: &RequestContext,
    ) -> Result<Response, BoxError> {
        let concrete = exception
            .as_any()
            .downcast_ref::<E>()
            .ok_or_else(|| CategoryMismatch {
                expected: ExceptionCategory::of::<E>(),
                found: exception.category(),
            })?;
        (self.factory)(concrete, context)
    }
}

/// Maps exception categories to response factories.
///
/// Built once at startup, then shared read-only (usually behind an `Arc`).
/// Registering a category again replaces its factory.
///
/// # Example
/// ```
/// use catchall::ExceptionResponseFactoryRegistry;
/// use axum::http::StatusCode;
/// use axum::response::IntoResponse;
/// use std::num::ParseIntError;
///
/// let mut factories = ExceptionResponseFactoryRegistry::new();
/// factories.register_factory(|_: &ParseIntError, _ctx| {
///     Ok((StatusCode::BAD_REQUEST, "not a number").into_response())
/// });
/// assert!(factories.contains(&catchall::ExceptionCategory::of::<ParseIntError>()));
/// ```
#[derive(Clone, Default)]
pub struct ExceptionResponseFactoryRegistry {
    factories: HashMap<ExceptionCategory, Arc<dyn ExceptionResponseFactory>>,
}

impl ExceptionResponseFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure building responses for exceptions of type `E`
    pub fn register_factory<E, F>(&mut self, factory: F) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
        F: Fn(&E, &RequestContext) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        let factory = TypedFactory {
            factory,
            _exception: PhantomData,
        };
        self.register(ExceptionCategory::of::<E>(), Arc::new(factory))
    }

    /// Register a factory object for `category`
    pub fn register(
        &mut self,
        category: ExceptionCategory,
        factory: Arc<dyn ExceptionResponseFactory>,
    ) -> &mut Self {
        self.factories.insert(category, factory);
        self
    }

    pub fn get_factory(&self, category: &ExceptionCategory) -> Option<&dyn ExceptionResponseFactory> {
        self.factories.get(category).map(|factory| factory.as_ref())
    }

    pub fn contains(&self, category: &ExceptionCategory) -> bool {
        self.factories.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ExceptionResponseFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.factories.keys().map(ExceptionCategory::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode, Uri};
    use axum::response::IntoResponse;
    use std::num::ParseIntError;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[derive(Debug, thiserror::Error)]
    #[error("plan expired")]
    struct PlanExpired;

    fn context() -> RequestContext {
        RequestContext::new(Method::GET, Uri::from_static("/billing"))
    }

    fn parse_error() -> ParseIntError {
        "x".parse::<u8>().unwrap_err()
    }

    #[test]
    fn test_missing_category_has_no_factory() {
        let registry = ExceptionResponseFactoryRegistry::new();
        assert!(registry.is_empty());
        assert!(
            registry
                .get_factory(&ExceptionCategory::of::<QuotaExceeded>())
                .is_none()
        );
    }

    #[test]
    fn test_registered_factory_builds_response() {
        let mut registry = ExceptionResponseFactoryRegistry::new();
        registry.register_factory(|_: &QuotaExceeded, ctx: &RequestContext| {
            assert_eq!(ctx.uri().path(), "/billing");
            Ok(StatusCode::TOO_MANY_REQUESTS.into_response())
        });

        let factory = registry
            .get_factory(&ExceptionCategory::of::<QuotaExceeded>())
            .unwrap();
        let response = factory.build_response(&QuotaExceeded, &context()).unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ExceptionResponseFactoryRegistry::new();
        registry
            .register_factory(|_: &QuotaExceeded, _| Ok(StatusCode::FORBIDDEN.into_response()))
            .register_factory(|_: &QuotaExceeded, _| Ok(StatusCode::PAYMENT_REQUIRED.into_response()));

        assert_eq!(registry.len(), 1);
        let response = registry
            .get_factory(&ExceptionCategory::of::<QuotaExceeded>())
            .unwrap()
            .build_response(&QuotaExceeded, &context())
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_lookup_is_exact_type() {
        let mut registry = ExceptionResponseFactoryRegistry::new();
        registry.register_factory(|_: &QuotaExceeded, _| Ok(StatusCode::FORBIDDEN.into_response()));

        assert!(registry.contains(&ExceptionCategory::of::<QuotaExceeded>()));
        assert!(!registry.contains(&ExceptionCategory::of::<PlanExpired>()));
        assert!(!registry.contains(&ExceptionCategory::of::<ParseIntError>()));
    }

    #[test]
    fn test_factory_rejects_other_categories() {
        let mut registry = ExceptionResponseFactoryRegistry::new();
        registry.register(
            ExceptionCategory::of::<PlanExpired>(),
            Arc::new(TypedFactory {
                factory: |_: &QuotaExceeded, _: &RequestContext| {
                    Ok::<_, BoxError>(StatusCode::FORBIDDEN.into_response())
                },
                _exception: PhantomData::<fn(&QuotaExceeded)>,
            }),
        );

        let err = registry
            .get_factory(&ExceptionCategory::of::<PlanExpired>())
            .unwrap()
            .build_response(&PlanExpired, &context())
            .err()
            .unwrap();
        let mismatch = err.downcast_ref::<CategoryMismatch>().unwrap();
        assert_eq!(mismatch.found, ExceptionCategory::of::<PlanExpired>());
        assert!(
            registry
                .get_factory(&ExceptionCategory::of::<PlanExpired>())
                .unwrap()
                .build_response(&parse_error(), &context())
                .is_err()
        );
    }
}
