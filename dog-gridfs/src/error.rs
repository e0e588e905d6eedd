use thiserror::Error;

/// Result type for GridFS operations
pub type GridFsResult<T> = Result<T, GridFsError>;

/// Errors that can occur during GridFS operations
#[derive(Error, Debug)]
pub enum GridFsError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("File not found: {target}")]
    FileNotFound { target: String },

    #[error("Storage engine error: {source}")]
    Storage {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl GridFsError {
    /// Create a storage engine error from any error type
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(error),
        }
    }

    /// Create an invalid argument error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a file not found error
    pub fn not_found<S: Into<String>>(target: S) -> Self {
        Self::FileNotFound {
            target: target.into(),
        }
    }

    /// True for failures caused by caller input rather than the storage engine
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::InvalidPattern { .. }
        )
    }
}
