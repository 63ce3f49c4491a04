//! Neon Quiz Back binary entrypoint wiring the quiz engine, REST, SSE and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::{
    game_store::{
        GameStateStore,
        file::{FileGameStore, FileStoreConfig},
        memory::MemoryGameStore,
    },
    storage::StorageError,
};
use services::{sse_events, storage_supervisor};
use state::{AppState, SharedState};

/// Environment variable selecting the storage backend.
const STORE_ENV: &str = "QUIZ_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    tokio::spawn(sse_events::forward_degraded_changes(app_state.clone()));
    spawn_storage_supervisor(app_state.clone())?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the storage supervisor for the backend named by `QUIZ_STORE` (`file` by default).
fn spawn_storage_supervisor(state: SharedState) -> anyhow::Result<()> {
    let backend = env::var(STORE_ENV).unwrap_or_else(|_| "file".into());
    info!(backend = %backend, "selecting storage backend");

    match backend.as_str() {
        "file" => {
            let config = FileStoreConfig::from_env().context("resolving file store directory")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = FileGameStore::connect(config).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStateStore>)
                }
            }));
        }
        "memory" => {
            tokio::spawn(storage_supervisor::run(state, || async {
                Ok::<_, StorageError>(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStateStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            use dao::game_store::couchdb::{CouchConfig, CouchGameStore};

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchGameStore::connect(config).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStateStore>)
                }
            }));
        }
        other => anyhow::bail!("unsupported storage backend `{other}`"),
    }
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
