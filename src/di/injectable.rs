use crate::di::Container;
use crate::error::Result;

/// Trait for types that can be constructed from the DI container
///
/// Register implementors with [`Container::register_injectable`]; the container
/// calls [`inject`](Injectable::inject) each time the type is resolved.
///
/// # Example
/// ```
/// use catchall::{Container, Injectable};
/// use std::sync::Arc;
///
/// struct Repository;
///
/// struct UserService {
///     repository: Arc<Repository>,
/// }
///
/// impl Injectable for UserService {
///     fn inject(container: &Container) -> catchall::Result<Self> {
///         Ok(Self {
///             repository: container.resolve::<Repository>()?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the container.
    fn inject(container: &Container) -> Result<Self>;
}
