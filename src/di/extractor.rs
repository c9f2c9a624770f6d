use crate::di::ContainerDependencyResolver;
use crate::exception::Thrown;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

/// Axum extractor for dependency injection
///
/// Resolves `T` through the state's [`ContainerDependencyResolver`]. A failed
/// resolution is rejected as a thrown
/// [`DependencyResolutionError`](crate::di::DependencyResolutionError), so it reaches
/// the exception handler like any other handler error.
///
/// # Example
/// ```
/// use catchall::{Inject, Thrown};
/// use axum::Json;
///
/// struct Greeting(&'static str);
///
/// async fn greet(Inject(greeting): Inject<Greeting>) -> Result<Json<&'static str>, Thrown> {
///     Ok(Json(greeting.0))
/// }
/// ```
pub struct Inject<T>(pub Arc<T>);

/// Trait that AppState must implement to provide the dependency resolver
pub trait HasResolver {
    fn resolver(&self) -> &ContainerDependencyResolver;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasResolver,
    T: 'static + Send + Sync,
{
    type Rejection = Thrown;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state
            .resolver()
            .resolve::<T>()
            .map(Inject)
            .map_err(Thrown::from)
    }
}

/// Deref implementation for convenient access to the inner service
impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Clone implementation to allow sharing the Arc
impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
