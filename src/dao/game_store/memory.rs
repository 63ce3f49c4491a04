use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    dao::{
        game_store::GameStateStore,
        migration::{history_from_value, state_from_value},
        models::{HistoryRecord, StateRecord},
        storage::{StorageError, StorageResult},
    },
    state::{game::GameState, history::HistoryEntry},
};

#[derive(Default)]
struct Records {
    state: Option<Value>,
    history: Option<Value>,
}

/// Process-local store keeping records as JSON documents, as a remote backend would.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    records: Arc<RwLock<Records>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw documents, e.g. records in the legacy layout.
    pub fn with_documents(state: Option<Value>, history: Option<Value>) -> Self {
        Self {
            records: Arc::new(RwLock::new(Records { state, history })),
        }
    }

    /// Raw state document as currently stored.
    pub async fn state_document(&self) -> Option<Value> {
        self.records.read().await.state.clone()
    }

    /// Raw history document as currently stored.
    pub async fn history_document(&self) -> Option<Value> {
        self.records.read().await.history.clone()
    }
}

fn encode<T: serde::Serialize>(record: &T, what: &str) -> StorageResult<Value> {
    serde_json::to_value(record)
        .map_err(|source| StorageError::corrupt(format!("failed to encode {what}"), source))
}

impl GameStateStore for MemoryGameStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn load_state(&self) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(value) = store.state_document().await else {
                return Ok(None);
            };
            state_from_value(value)
                .map(Some)
                .map_err(|source| StorageError::corrupt("quiz state".into(), source))
        })
    }

    fn save_state(&self, game: GameState) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let value = encode(&StateRecord::new(game), "quiz state")?;
            store.records.write().await.state = Some(value);
            Ok(())
        })
    }

    fn load_history(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntry>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(value) = store.history_document().await else {
                return Ok(Vec::new());
            };
            history_from_value(value)
                .map_err(|source| StorageError::corrupt("quiz history".into(), source))
        })
    }

    fn save_history(&self, entries: Vec<HistoryEntry>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let value = encode(&HistoryRecord::new(entries), "quiz history")?;
            store.records.write().await.history = Some(value);
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut records = store.records.write().await;
            records.state = None;
            records.history = None;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Store whose every operation fails, for exercising degraded persistence.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct FailingGameStore;

#[cfg(test)]
impl FailingGameStore {
    fn failure() -> StorageError {
        StorageError::unavailable(
            "backend offline".into(),
            std::io::Error::other("connection refused"),
        )
    }
}

#[cfg(test)]
impl GameStateStore for FailingGameStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    fn load_state(&self) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn save_state(&self, _game: GameState) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn load_history(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntry>>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn save_history(&self, _entries: Vec<HistoryEntry>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Err(Self::failure()) })
    }
}
