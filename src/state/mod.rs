pub mod clock;
pub mod engine;
pub mod game;
pub mod history;
pub mod scoring;
pub mod setup;
mod sse;
pub mod state_machine;
pub mod ticker;
pub mod transitions;
pub mod turns;
pub mod ui;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};
use tracing::info;

use crate::{config::AppConfig, dao::game_store::GameStateStore};

pub use self::sse::SseHub;
use self::{
    clock::{Clock, SystemClock},
    engine::QuizEngine,
    sse::SseState,
    ticker::Ticker,
};

pub type SharedState = Arc<AppState>;

/// Central application state: the quiz engine, its countdown task, SSE hubs and the store.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStateStore>>>,
    sse: SseState,
    engine: Mutex<QuizEngine>,
    ticker: Ticker,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let engine = QuizEngine::new(clock, config.history_capacity, config.tie_breaker.clone());
        Arc::new(Self {
            config,
            game_store: RwLock::new(None),
            sse: SseState::new(64, 16),
            engine: Mutex::new(engine),
            ticker: Ticker::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStateStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a store, attach it to the engine and leave degraded mode.
    ///
    /// A persisted quiz is loaded when the engine holds none yet; returns whether one was.
    pub async fn install_game_store(&self, store: Arc<dyn GameStateStore>) -> bool {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store.clone());
        }
        let restored = {
            let mut engine = self.engine.lock().await;
            engine.attach_store(store.clone());
            engine.restore_from_store().await
        };
        info!(backend = store.backend(), restored, "storage backend installed");
        self.update_degraded(false);
        restored
    }

    /// Detach the store and enter degraded mode. The in-memory quiz keeps running.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.engine.lock().await.detach_store();
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the host SSE stream.
    pub fn host_sse(&self) -> &SseHub {
        self.sse.host().hub()
    }

    /// Token guard that ensures a single host console at a time.
    pub fn host_token(&self) -> &Mutex<Option<String>> {
        self.sse.host().token()
    }

    /// Quiz engine; holding the lock serialises host actions and ticks.
    pub fn engine(&self) -> &Mutex<QuizEngine> {
        &self.engine
    }

    /// Countdown task driving [`QuizEngine::tick`].
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }
}
