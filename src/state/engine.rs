use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    dao::game_store::GameStateStore,
    state::{
        clock::{Clock, TimerState},
        game::TieBreakerBank,
        history::{History, HistoryEntry, normalize_for_snapshot},
        state_machine::{InvalidAction, QuizAction, QuizSession},
        ui::UiFlags,
    },
};

/// Reason recorded with the snapshot seeded after loading a persisted quiz.
pub const INITIAL_SNAPSHOT_REASON: &str = "initial";

/// Refusals surfaced by [`QuizEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The state machine rejected the action.
    #[error(transparent)]
    Invalid(#[from] InvalidAction),
    /// Revert was requested with an empty history.
    #[error("nothing to revert")]
    NothingToRevert,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Timer after the tick.
    pub timer: TimerState,
    /// Whether the countdown value moved.
    pub changed: bool,
    /// Whether the countdown should keep ticking.
    pub ticking: bool,
    /// Countdown reached zero on this tick.
    pub time_up: bool,
}

/// Drives a [`QuizSession`] with undo history and best-effort persistence.
///
/// Every host action is snapshotted before it is applied. Storage failures are logged and
/// never undo an in-memory transition.
pub struct QuizEngine {
    session: QuizSession,
    history: History,
    store: Option<Arc<dyn GameStateStore>>,
    clock: Arc<dyn Clock>,
    default_bank: TieBreakerBank,
}

impl QuizEngine {
    /// Engine with an empty session and no store attached.
    pub fn new(clock: Arc<dyn Clock>, history_capacity: usize, default_bank: TieBreakerBank) -> Self {
        Self {
            session: QuizSession::default(),
            history: History::new(history_capacity),
            store: None,
            clock,
            default_bank,
        }
    }

    /// Current session.
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Snapshot stack, oldest first.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether a revert would succeed.
    pub fn can_revert(&self) -> bool {
        !self.history.is_empty()
    }

    /// Current time according to the engine clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Attach a store; subsequent transitions are persisted to it.
    pub fn attach_store(&mut self, store: Arc<dyn GameStateStore>) {
        self.store = Some(store);
    }

    /// Detach the store; transitions stay in memory only.
    pub fn detach_store(&mut self) {
        self.store = None;
    }

    /// Apply a host action.
    ///
    /// The session before the action is pushed onto the history, except for
    /// [`QuizAction::Restart`] which wipes history and persisted records.
    pub async fn dispatch(&mut self, action: QuizAction) -> Result<&QuizSession, EngineError> {
        let now = self.clock.now_ms();
        let reason = action.reason();
        let restart = matches!(action, QuizAction::Restart);
        let action = match action {
            QuizAction::Setup(mut game) => {
                if game.tie_breaker.questions.is_empty() {
                    game.tie_breaker = self.default_bank.clone();
                }
                QuizAction::Setup(game)
            }
            other => other,
        };

        let next = self.session.apply(action, now)?;
        debug!(reason, phase = ?next.game.phase, "host action applied");

        if restart {
            self.history.clear();
            self.session = next;
            self.clear_store().await;
            return Ok(&self.session);
        }

        self.history
            .push(HistoryEntry::capture(&self.session, reason, now));
        self.session = next;
        self.persist_history().await;
        self.persist_state().await;
        Ok(&self.session)
    }

    /// Restore the session captured before the most recent action.
    pub async fn revert(&mut self) -> Result<&QuizSession, EngineError> {
        let entry = self.history.pop().ok_or(EngineError::NothingToRevert)?;
        debug!(reason = %entry.reason, "reverting host action");
        self.session = entry.restore();
        self.persist_history().await;
        self.persist_state().await;
        Ok(&self.session)
    }

    /// Advance the countdown to the current time. Not recorded in the history.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now_ms();
        let before = self.session.game.timer;
        let was_up = self.session.ui.time_up;
        match self.session.apply(QuizAction::Tick, now) {
            Ok(next) => self.session = next,
            Err(err) => warn!(error = %err, "countdown tick rejected"),
        }

        let timer = self.session.game.timer;
        let changed = timer != before;
        if changed {
            self.persist_state().await;
        }
        TickOutcome {
            timer,
            changed,
            ticking: self.session.timer_is_ticking(),
            time_up: self.session.ui.time_up && !was_up,
        }
    }

    /// Load the persisted quiz when the engine does not hold one yet.
    ///
    /// The loaded timer is paused and the screen flags are rebuilt. An empty history is seeded
    /// with an [`INITIAL_SNAPSHOT_REASON`] entry. Returns whether a quiz was loaded.
    pub async fn restore_from_store(&mut self) -> bool {
        let Some(store) = self.store.clone() else {
            return false;
        };
        if self.session != QuizSession::default() {
            return false;
        }

        let game = match store.load_state().await {
            Ok(Some(game)) => game,
            Ok(None) => return false,
            Err(err) => {
                warn!(backend = store.backend(), error = %err, "failed to load quiz state");
                return false;
            }
        };

        let now = self.clock.now_ms();
        let mut game = normalize_for_snapshot(&game, now);
        if game.tie_breaker.questions.is_empty() {
            game.tie_breaker = self.default_bank.clone();
        }
        let ui = UiFlags::for_state(&game);
        self.session = QuizSession { game, ui };

        let entries = match store.load_history().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(backend = store.backend(), error = %err, "failed to load quiz history");
                Vec::new()
            }
        };
        self.history = History::from_entries(entries, self.history.capacity());
        if self.history.is_empty() {
            self.history.push(HistoryEntry::capture(
                &self.session,
                INITIAL_SNAPSHOT_REASON,
                now,
            ));
            self.persist_history().await;
        }

        info!(
            backend = store.backend(),
            phase = ?self.session.game.phase,
            history = self.history.len(),
            "restored persisted quiz"
        );
        true
    }

    async fn persist_state(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save_state(self.session.game.clone()).await {
            warn!(backend = store.backend(), error = %err, "failed to persist quiz state");
        }
    }

    async fn persist_history(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save_history(self.history.to_vec()).await {
            warn!(backend = store.backend(), error = %err, "failed to persist quiz history");
        }
    }

    async fn clear_store(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.clear().await {
            warn!(backend = store.backend(), error = %err, "failed to clear persisted quiz");
        }
    }
}
