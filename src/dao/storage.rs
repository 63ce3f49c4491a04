use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of where records are kept.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record exists but cannot be understood.
    #[error("stored record is unreadable: {message}")]
    Corrupt {
        /// Which record failed.
        message: String,
        /// Decoding failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corrupt-record error from any decoding failure.
    pub fn corrupt(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Corrupt {
            message,
            source: Box::new(source),
        }
    }
}
