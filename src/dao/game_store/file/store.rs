use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::{
    dao::{
        game_store::GameStateStore,
        migration::{history_from_value, state_from_value},
        models::{HistoryRecord, StateRecord},
        storage::StorageResult,
    },
    state::{game::GameState, history::HistoryEntry},
};

use super::{
    config::FileStoreConfig,
    error::{FileDaoError, FileResult},
};

const STATE_FILE: &str = "quiz_state.json";
const HISTORY_FILE: &str = "quiz_history.json";

/// Store keeping each record as a JSON file inside one directory.
#[derive(Clone)]
pub struct FileGameStore {
    dir: Arc<Path>,
}

impl FileGameStore {
    /// Open the store, creating the directory when missing.
    pub async fn connect(config: FileStoreConfig) -> FileResult<Self> {
        let store = Self {
            dir: Arc::from(config.dir.as_path()),
        };
        store.ensure_directory().await?;
        Ok(store)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn ensure_directory(&self) -> FileResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| FileDaoError::Directory {
                path: self.dir.to_path_buf(),
                source,
            })
    }

    async fn read_document(&self, name: &str) -> FileResult<Option<Value>> {
        let path = self.path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(FileDaoError::Read { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| FileDaoError::Decode { path, source })
    }

    /// Write through a sibling temp file so a crash never leaves a truncated document.
    async fn write_document<T: Serialize>(&self, name: &str, record: &T) -> FileResult<()> {
        let path = self.path(name);
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| FileDaoError::Encode {
            path: path.clone(),
            source,
        })?;
        let temp = path.with_extension("json.tmp");
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|source| FileDaoError::Write {
                path: temp.clone(),
                source,
            })?;
        tokio::fs::rename(&temp, &path)
            .await
            .map_err(|source| FileDaoError::Write { path, source })
    }

    async fn remove_document(&self, name: &str) -> FileResult<()> {
        let path = self.path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileDaoError::Remove { path, source }),
        }
    }
}

impl GameStateStore for FileGameStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn load_state(&self) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(value) = store.read_document(STATE_FILE).await? else {
                return Ok(None);
            };
            let game = state_from_value(value).map_err(|source| FileDaoError::Decode {
                path: store.path(STATE_FILE),
                source,
            })?;
            Ok(Some(game))
        })
    }

    fn save_state(&self, game: GameState) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_document(STATE_FILE, &StateRecord::new(game))
                .await
                .map_err(Into::into)
        })
    }

    fn load_history(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntry>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(value) = store.read_document(HISTORY_FILE).await? else {
                return Ok(Vec::new());
            };
            let entries = history_from_value(value).map_err(|source| FileDaoError::Decode {
                path: store.path(HISTORY_FILE),
                source,
            })?;
            Ok(entries)
        })
    }

    fn save_history(&self, entries: Vec<HistoryEntry>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_document(HISTORY_FILE, &HistoryRecord::new(entries))
                .await
                .map_err(Into::into)
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.remove_document(STATE_FILE).await?;
            store.remove_document(HISTORY_FILE).await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let metadata =
                tokio::fs::metadata(&store.dir)
                    .await
                    .map_err(|source| FileDaoError::Directory {
                        path: store.dir.to_path_buf(),
                        source,
                    })?;
            if metadata.is_dir() {
                Ok(())
            } else {
                Err(FileDaoError::Directory {
                    path: store.dir.to_path_buf(),
                    source: std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_directory().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;
    use serde_json::json;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("neon-quiz-store-{}", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn round_trips_records_and_clears_them() {
        let dir = scratch_dir();
        let store = FileGameStore::connect(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        store.health_check().await.unwrap();
        assert!(store.load_state().await.unwrap().is_none());

        let game = GameState {
            teams: vec!["Owls".into(), "Foxes".into()],
            ..GameState::default()
        };
        store.save_state(game.clone()).await.unwrap();
        assert_eq!(store.load_state().await.unwrap(), Some(game));
        assert!(dir.join(STATE_FILE).exists());
        assert!(!dir.join("quiz_state.json.tmp").exists());

        store.clear().await.unwrap();
        assert!(!dir.join(STATE_FILE).exists());
        store.clear().await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn legacy_history_file_is_migrated() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let legacy = json!([{
            "quizState": { "teams": ["A", "B"], "started": false },
            "ui": {},
            "ts": 1700000000000u64,
            "reason": "initial"
        }]);
        std::fs::write(dir.join(HISTORY_FILE), legacy.to_string()).unwrap();

        let store = FileGameStore::connect(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        let entries = store.load_history().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason, "initial");
        assert_eq!(entries[0].game.teams, vec!["A", "B"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn invalid_json_is_corrupt() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(STATE_FILE), "{ not json").unwrap();
        let store = FileGameStore::connect(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        let err = store.load_state().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));

        let _ = std::fs::remove_dir_all(dir);
    }
}
