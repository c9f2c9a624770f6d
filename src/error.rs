use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContainerError>;

/// Type-erased error used at service and factory boundaries
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the DI container itself
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Failed to construct {type_name}: {message}")]
    ConstructionFailed { type_name: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContainerError {
    pub(crate) fn downcast_failed<T: ?Sized>() -> Self {
        Self::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Create a construction failure for `T`, typically from inside a factory
    pub fn construction_failed<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            type_name: std::any::type_name::<T>().to_string(),
            message: message.into(),
        }
    }
}
