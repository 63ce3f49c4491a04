use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

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
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchDocument, HISTORY_DOC_ID, STATE_DOC_ID},
};

/// Store keeping the quiz records as two CouchDB documents.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;
        let store = Self {
            client,
            database_url: Arc::from(config.database_url()),
            credentials: config.credentials.map(Arc::new),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.as_deref() {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn database(&self, method: Method) -> RequestBuilder {
        self.authorize(self.client.request(method, self.database_url.as_ref()))
    }

    fn document(&self, method: Method, doc_id: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.database_url, doc_id);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let target = self.database_url.as_ref();
        let response = self
            .database(Method::GET)
            .send()
            .await
            .map_err(CouchDaoError::transport(target))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self
                    .database(Method::PUT)
                    .send()
                    .await
                    .map_err(CouchDaoError::transport(target))?;
                if created.status().is_success() {
                    info!(database = target, "created CouchDB database for quiz records");
                    Ok(())
                } else {
                    Err(CouchDaoError::status(target, created.status()))
                }
            }
            other => Err(CouchDaoError::status(target, other)),
        }
    }

    async fn fetch(&self, doc_id: &str) -> CouchResult<Option<CouchDocument>> {
        let response = self
            .document(Method::GET, doc_id)
            .send()
            .await
            .map_err(CouchDaoError::transport(doc_id))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document = response.json::<CouchDocument>().await.map_err(|source| {
                    CouchDaoError::Payload {
                        target: doc_id.to_string(),
                        source,
                    }
                })?;
                Ok(Some(document))
            }
            other => Err(CouchDaoError::status(doc_id, other)),
        }
    }

    async fn current_rev(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self.fetch(doc_id).await?.and_then(|doc| doc.rev))
    }

    /// Replace `doc_id` with `record`, reusing the stored revision when the document exists.
    async fn replace<T: Serialize>(&self, doc_id: &str, record: &T) -> CouchResult<()> {
        let body = serde_json::to_value(record).map_err(|source| CouchDaoError::Encode {
            target: doc_id.to_string(),
            source,
        })?;
        let document = CouchDocument::new(doc_id, self.current_rev(doc_id).await?, body);

        let response = self
            .document(Method::PUT, doc_id)
            .json(&document)
            .send()
            .await
            .map_err(CouchDaoError::transport(doc_id))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::status(doc_id, response.status()))
        }
    }

    async fn remove(&self, doc_id: &str) -> CouchResult<()> {
        let Some(rev) = self.current_rev(doc_id).await? else {
            return Ok(());
        };

        let response = self
            .document(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(CouchDaoError::transport(doc_id))?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            other => Err(CouchDaoError::status(doc_id, other)),
        }
    }

    async fn body(&self, doc_id: &str) -> CouchResult<Option<Value>> {
        Ok(self.fetch(doc_id).await?.map(|doc| doc.body))
    }
}

fn decode_error(doc_id: &str) -> impl FnOnce(serde_json::Error) -> CouchDaoError + '_ {
    move |source| CouchDaoError::Decode {
        target: doc_id.to_string(),
        source,
    }
}

impl GameStateStore for CouchGameStore {
    fn backend(&self) -> &'static str {
        "couchdb"
    }

    fn load_state(&self) -> BoxFuture<'static, StorageResult<Option<GameState>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(body) = store.body(STATE_DOC_ID).await? else {
                return Ok(None);
            };
            let game = state_from_value(body).map_err(decode_error(STATE_DOC_ID))?;
            Ok(Some(game))
        })
    }

    fn save_state(&self, game: GameState) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace(STATE_DOC_ID, &StateRecord::new(game))
                .await
                .map_err(Into::into)
        })
    }

    fn load_history(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntry>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(body) = store.body(HISTORY_DOC_ID).await? else {
                return Ok(Vec::new());
            };
            let entries = history_from_value(body).map_err(decode_error(HISTORY_DOC_ID))?;
            Ok(entries)
        })
    }

    fn save_history(&self, entries: Vec<HistoryEntry>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace(HISTORY_DOC_ID, &HistoryRecord::new(entries))
                .await
                .map_err(Into::into)
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.remove(STATE_DOC_ID).await?;
            store.remove(HISTORY_DOC_ID).await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = store.database_url.as_ref();
            let response = store
                .database(Method::GET)
                .send()
                .await
                .map_err(CouchDaoError::transport(target))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::status(target, response.status()).into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
