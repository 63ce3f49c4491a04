//! Error types of the JSON file storage implementation.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`FileDaoError`] failures.
pub type FileResult<T> = Result<T, FileDaoError>;

/// Failures that can occur while reading or writing the quiz documents.
#[derive(Debug, Error)]
pub enum FileDaoError {
    /// No home directory could be determined and `QUIZ_DATA_DIR` is unset.
    #[error("no data directory available; set QUIZ_DATA_DIR")]
    NoDataDirectory,
    /// The data directory could not be created or inspected.
    #[error("data directory `{path}` is not usable")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading a document failed for a reason other than absence.
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing or replacing a document failed.
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Removing a document failed.
    #[error("failed to remove `{path}`")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A record could not be serialised.
    #[error("failed to encode `{path}`")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A document is not valid JSON or not a known record layout.
    #[error("failed to decode `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileDaoError> for StorageError {
    fn from(err: FileDaoError) -> Self {
        match err {
            FileDaoError::Decode { .. } => {
                StorageError::corrupt("file document unreadable".into(), err)
            }
            other => StorageError::unavailable("file store operation failed".into(), other),
        }
    }
}
