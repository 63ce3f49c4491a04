use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document id of the current game state.
pub const STATE_DOC_ID: &str = "quiz::state";
/// Document id of the undo history.
pub const HISTORY_DOC_ID: &str = "quiz::history";

/// A quiz record as stored in CouchDB: the record fields plus `_id` and `_rev`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: Value,
}

impl CouchDocument {
    /// Wrap an encoded record, carrying the revision it replaces.
    pub fn new(id: &str, rev: Option<String>, body: Value) -> Self {
        Self {
            id: id.to_string(),
            rev,
            body,
        }
    }
}
