use thiserror::Error;

/// Unified error type for app-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("{service} failed: {message}")]
    Service { service: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in app-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a descriptor error with context
    pub fn descriptor(msg: impl Into<String>) -> Self {
        ReleaseError::Descriptor(msg.into())
    }

    /// Create an error reported by an external collaborator
    pub fn service(service: impl Into<String>, msg: impl Into<String>) -> Self {
        ReleaseError::Service {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Whether this error was raised before anything ran (bad input or setup)
    pub fn is_config(&self) -> bool {
        matches!(self, ReleaseError::Config(_))
    }
}
