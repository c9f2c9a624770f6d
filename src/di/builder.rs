use std::sync::Arc;
use crate::di::{Container, Injectable};
use crate::error::Result;

/// Builder for constructing a dependency injection container
///
/// Use this to configure and register services before building the final container.
///
/// # Example
/// ```
/// use catchall::ContainerBuilder;
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let container = ContainerBuilder::new()
///     .register(SystemClock)
///     .bind::<dyn Clock, SystemClock, _>(|clock| clock as Arc<dyn Clock>)
///     .alias::<dyn Clock>("clock")
///     .build();
///
/// assert!(container.contains::<dyn Clock>());
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register a service instance
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Register a factory invoked on every resolution
    pub fn factory<T, F>(mut self, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&Container) -> Result<T> + 'static + Send + Sync,
    {
        self.container.register_factory(factory);
        self
    }

    /// Register a type built through its [`Injectable`] implementation
    pub fn injectable<T: Injectable>(mut self) -> Self {
        self.container.register_injectable::<T>();
        self
    }

    /// Bind a trait to a concrete implementation
    ///
    /// This enables resolving `Arc<dyn Trait>` to the registered implementation.
    /// The implementation must have been registered first (or will be).
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.container.register_trait::<Trait, Impl, F>(caster);
        self
    }

    /// Expose a registered type under an additional name
    pub fn alias<T: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.container.alias::<T>(name);
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
