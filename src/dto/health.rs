use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Name of the installed storage backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl HealthResponse {
    /// Storage backend reachable.
    pub fn ok(store: &str) -> Self {
        Self {
            status: "ok".to_string(),
            store: Some(store.to_string()),
        }
    }

    /// Running on in-memory state only.
    pub fn degraded(store: Option<&str>) -> Self {
        Self {
            status: "degraded".to_string(),
            store: store.map(str::to_string),
        }
    }
}
