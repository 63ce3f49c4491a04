use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStateStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state in degraded mode while it is
/// unavailable. The quiz keeps running in memory throughout.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStateStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                let restored = state.install_game_store(store.clone()).await;
                info!(
                    backend = store.backend(),
                    restored, "storage connection established; leaving degraded mode"
                );
                delay = INITIAL_DELAY;

                if !supervise(&state, store.as_ref()).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    state.clear_game_store().await;
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store health, reconnecting on failure. Returns `false` once reconnection gave up.
async fn supervise(state: &SharedState, store: &dyn GameStateStore) -> bool {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        let mut reconnect_delay = INITIAL_DELAY;
        let mut reconnected = false;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            match store.try_reconnect().await {
                Ok(()) => {
                    info!("storage reconnection succeeded after health check failure");
                    reconnected = true;
                    break;
                }
                Err(reconnect_err) => {
                    if attempt == 0 {
                        warn!(
                            attempt, error = %reconnect_err,
                            "storage reconnect first attempt failed; entering degraded mode"
                        );
                        state.update_degraded(true);
                    } else {
                        warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                    }
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                }
            }
        }

        if !reconnected {
            return false;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}
