use std::env;

use super::error::{CouchDaoError, CouchResult};

/// Connection settings of the CouchDB backend.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the quiz documents.
    pub database: String,
    /// Basic-auth user and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` and `COUCH_DB`, plus `COUCH_USERNAME`/`COUCH_PASSWORD` when both set.
    pub fn from_env() -> CouchResult<Self> {
        Ok(Self {
            base_url: required("COUCH_BASE_URL")?,
            database: required("COUCH_DB")?,
            credentials: env::var("COUCH_USERNAME")
                .ok()
                .zip(env::var("COUCH_PASSWORD").ok()),
        })
    }

    pub(super) fn database_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.database)
    }
}

fn required(var: &'static str) -> CouchResult<String> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(CouchDaoError::MissingEnvVar { var })
}
