use serde::{Deserialize, Serialize};

/// Main result type for optimizer operations
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    NotFitted,
    InvalidInput,
    ConfigError,
    SerializationError,
    IoError,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Errors raised by compression, pruning and configuration.
///
/// Cache lookups never produce one of these: a miss is `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptError {
    #[error("Compressor not fitted: {0}")]
    NotFitted(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl OptError {
    pub fn not_fitted(message: impl Into<String>) -> Self {
        Self::NotFitted(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFitted(_) => ErrorCode::NotFitted,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Serialization(_) => ErrorCode::SerializationError,
            Self::Io(_) => ErrorCode::IoError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFitted(_) | Self::InvalidInput(_) => ErrorSeverity::Medium,
            Self::Serialization(_) | Self::Io(_) => ErrorSeverity::High,
            Self::Config(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether the pipeline can carry on, e.g. by retrying with other
    /// parameters or skipping optimization for the batch.
    pub fn is_recoverable(&self) -> bool {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => true,
            ErrorSeverity::High => matches!(self.code(), ErrorCode::IoError),
            ErrorSeverity::Critical => false,
        }
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for OptError {
    fn from(err: serde_json::Error) -> Self {
        OptError::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for OptError {
    fn from(err: std::io::Error) -> Self {
        OptError::Io(err.to_string())
    }
}
