use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether a storage backend is installed and reachable.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.game_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthResponse::degraded(None);
    };

    if let Err(err) = store.health_check().await {
        warn!(backend = store.backend(), error = %err, "storage health check failed");
        return HealthResponse::degraded(Some(store.backend()));
    }

    if state.is_degraded() {
        HealthResponse::degraded(Some(store.backend()))
    } else {
        HealthResponse::ok(store.backend())
    }
}
