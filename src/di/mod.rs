mod builder;
mod container;
mod extractor;
mod injectable;
mod resolver;

pub use builder::ContainerBuilder;
pub use container::{Container, Instance};
pub use extractor::{HasResolver, Inject};
pub use injectable::Injectable;
pub use resolver::{ContainerDependencyResolver, DependencyResolutionError, DependencyResolver};
