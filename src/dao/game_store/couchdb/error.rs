//! Failures of the CouchDB quiz store.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for CouchDB operations.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// What went wrong talking to CouchDB. `target` is the database or document addressed.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    Client(#[source] reqwest::Error),
    /// The request never got a response.
    #[error("CouchDB request to `{target}` failed")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status the store does not expect.
    #[error("CouchDB answered {status} for `{target}`")]
    Status { target: String, status: StatusCode },
    /// The response body is not a CouchDB document.
    #[error("unreadable CouchDB response for `{target}`")]
    Payload {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// A quiz record could not be turned into JSON.
    #[error("failed to encode quiz record `{target}`")]
    Encode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
    /// A stored document is not a known quiz record layout.
    #[error("stored quiz record `{target}` has an unknown layout")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CouchDaoError {
    pub(super) fn transport(target: &str) -> impl FnOnce(reqwest::Error) -> Self + '_ {
        move |source| Self::Transport {
            target: target.to_string(),
            source,
        }
    }

    pub(super) fn status(target: &str, status: StatusCode) -> Self {
        Self::Status {
            target: target.to_string(),
            status,
        }
    }
}

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Decode { .. } => {
                StorageError::corrupt("CouchDB quiz record unreadable".into(), err)
            }
            other => StorageError::unavailable("CouchDB unreachable".into(), other),
        }
    }
}
