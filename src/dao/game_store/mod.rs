#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::{
    dao::storage::StorageResult,
    state::{game::GameState, history::HistoryEntry},
};

/// Key-value persistence for the two quiz records: the current state and the undo history.
///
/// Writes replace the whole record. Loading upgrades records written in the legacy layout.
pub trait GameStateStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;
    /// Load the current game state, `None` when nothing was saved.
    fn load_state(&self) -> BoxFuture<'static, StorageResult<Option<GameState>>>;
    /// Replace the current game state.
    fn save_state(&self, game: GameState) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the undo history, oldest first; empty when nothing was saved.
    fn load_history(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntry>>>;
    /// Replace the undo history.
    fn save_history(&self, entries: Vec<HistoryEntry>) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove both records.
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
