use crate::di::{Container, Instance};
use crate::error::ContainerError;
use std::sync::Arc;
use thiserror::Error;

/// Raised when the container cannot produce an instance for a requested type.
///
/// Carries the requested type name and the container's own failure as its source.
#[derive(Debug, Error)]
#[error("Could not resolve dependencies for {type_name}")]
pub struct DependencyResolutionError {
    type_name: String,
    #[source]
    source: ContainerError,
}

impl DependencyResolutionError {
    pub fn new(type_name: impl Into<String>, source: ContainerError) -> Self {
        Self {
            type_name: type_name.into(),
            source,
        }
    }

    /// The type (or alias) that was requested
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The underlying container failure
    pub fn container_error(&self) -> &ContainerError {
        &self.source
    }
}

/// Resolves controller and handler dependencies by name.
pub trait DependencyResolver: Send + Sync {
    /// Resolve the service registered under `type_name`
    ///
    /// # Errors
    /// Any container failure is reported as a [`DependencyResolutionError`].
    fn resolve_named(&self, type_name: &str) -> Result<Instance, DependencyResolutionError>;
}

/// [`DependencyResolver`] backed by a [`Container`]
#[derive(Clone)]
pub struct ContainerDependencyResolver {
    container: Arc<Container>,
}

impl ContainerDependencyResolver {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolve a concrete service
    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>, DependencyResolutionError> {
        self.container
            .resolve::<T>()
            .map_err(|e| DependencyResolutionError::new(std::any::type_name::<T>(), e))
    }

    /// Resolve a trait object bound with [`Container::register_trait`]
    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(
        &self,
    ) -> Result<Arc<T>, DependencyResolutionError> {
        self.container
            .resolve_trait::<T>()
            .map_err(|e| DependencyResolutionError::new(std::any::type_name::<T>(), e))
    }
}

impl DependencyResolver for ContainerDependencyResolver {
    fn resolve_named(&self, type_name: &str) -> Result<Instance, DependencyResolutionError> {
        self.container
            .resolve_by_name(type_name)
            .map_err(|e| DependencyResolutionError::new(type_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    struct Mailer {
        sender: &'static str,
    }

    struct SignupController {
        mailer: Arc<Mailer>,
    }

    trait Notifier: Send + Sync {
        fn channel(&self) -> &'static str;
    }

    impl Notifier for Mailer {
        fn channel(&self) -> &'static str {
            "email"
        }
    }

    fn resolver(container: Container) -> ContainerDependencyResolver {
        ContainerDependencyResolver::new(Arc::new(container))
    }

    #[test]
    fn test_resolves_through_container() {
        let mut container = Container::new();
        container.register(Mailer { sender: "noreply" });
        container.register_factory(|c: &Container| {
            Ok(SignupController {
                mailer: c.resolve::<Mailer>()?,
            })
        });

        let controller = resolver(container).resolve::<SignupController>().unwrap();
        assert_eq!(controller.mailer.sender, "noreply");
    }

    #[test]
    fn test_resolves_trait_bindings() {
        let mut container = Container::new();
        container.register(Mailer { sender: "noreply" });
        container.register_trait::<dyn Notifier, Mailer, _>(|m| m as Arc<dyn Notifier>);

        let notifier = resolver(container).resolve_trait::<dyn Notifier>().unwrap();
        assert_eq!(notifier.channel(), "email");
    }

    #[test]
    fn test_unregistered_type_names_the_requested_type() {
        let err = resolver(Container::new())
            .resolve::<SignupController>()
            .err()
            .unwrap();

        assert!(err.type_name().ends_with("SignupController"));
        assert!(
            err.to_string()
                .starts_with("Could not resolve dependencies for")
        );
        assert!(err.to_string().contains("SignupController"));
    }

    #[test]
    fn test_failure_wraps_container_error_as_source() {
        let mut container = Container::new();
        container.register_factory(|c: &Container| {
            Ok(SignupController {
                mailer: c.resolve::<Mailer>()?,
            })
        });

        let err = resolver(container)
            .resolve::<SignupController>()
            .err()
            .unwrap();

        assert!(matches!(
            err.container_error(),
            ContainerError::DependencyNotFound { type_name } if type_name.ends_with("Mailer")
        ));
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<ContainerError>().is_some());
    }

    #[test]
    fn test_resolve_named_through_trait_object() {
        let mut container = Container::new();
        container.register(Mailer { sender: "ops" });
        container.alias::<Mailer>("mailer");

        let resolver: Box<dyn DependencyResolver> = Box::new(resolver(container));
        let mailer = resolver
            .resolve_named("mailer")
            .unwrap()
            .downcast::<Mailer>()
            .unwrap();
        assert_eq!(mailer.sender, "ops");

        let err = resolver.resolve_named("payments").err().unwrap();
        assert_eq!(err.type_name(), "payments");
    }

    #[test]
    fn test_trait_failure_wraps_implementation_construction_error() {
        let mut container = Container::new();
        container.register_factory::<Mailer, _>(|_| {
            Err(ContainerError::construction_failed::<Mailer>("smtp down"))
        });
        container.register_trait::<dyn Notifier, Mailer, _>(|m| m as Arc<dyn Notifier>);
        let resolver = resolver(container);

        let err = resolver.resolve_trait::<dyn Notifier>().err().unwrap();
        assert!(err.type_name().ends_with("Notifier"));
        assert!(matches!(
            err.container_error(),
            ContainerError::ConstructionFailed { message, .. } if message == "smtp down"
        ));

        let by_name = resolver
            .resolve_named(std::any::type_name::<dyn Notifier>())
            .err()
            .unwrap();
        assert!(matches!(
            by_name.container_error(),
            ContainerError::ConstructionFailed { .. }
        ));
    }
}
