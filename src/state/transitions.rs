use std::sync::Arc;

use tracing::debug;

use crate::{
    dto::{quiz::QuizView, sse::TimerTickEvent},
    error::ServiceError,
    services::sse_events::{broadcast_quiz_state, broadcast_timer_tick},
    state::{
        SharedState,
        clock::TimerState,
        state_machine::QuizAction,
        ticker::TICK_PERIOD,
    },
};

/// Mutation requested from the host console.
#[derive(Debug)]
pub enum HostCommand {
    /// Apply an action, snapshotting the session first.
    Apply(QuizAction),
    /// Undo the most recent action.
    Revert,
}

/// Run a host command under the engine lock, re-arm the countdown and broadcast the new state.
pub async fn run_command_with_broadcast(
    state: &SharedState,
    command: HostCommand,
) -> Result<QuizView, ServiceError> {
    let view = {
        let mut engine = state.engine().lock().await;
        let before = engine.session().game.timer;
        let session = match command {
            HostCommand::Apply(action) => engine.dispatch(action).await?,
            HostCommand::Revert => engine.revert().await?,
        };
        sync_ticker(state, &before, &session.game.timer, session.timer_is_ticking());
        QuizView::from_engine(&engine)
    };
    broadcast_quiz_state(state, &view);
    Ok(view)
}

/// Advance the countdown by one tick and broadcast the result.
///
/// Returns whether the countdown should keep ticking.
pub async fn tick_with_broadcast(state: &SharedState) -> bool {
    let (outcome, view) = {
        let mut engine = state.engine().lock().await;
        let outcome = engine.tick().await;
        let view = (outcome.time_up || !outcome.ticking).then(|| QuizView::from_engine(&engine));
        (outcome, view)
    };

    if outcome.changed {
        broadcast_timer_tick(state, &TimerTickEvent::new(&outcome.timer, outcome.time_up));
    }
    if let Some(view) = view {
        debug!(time_up = outcome.time_up, "countdown stopped");
        broadcast_quiz_state(state, &view);
    }
    outcome.ticking
}

/// Arm the countdown task when the timer should tick and was re-anchored, disarm it otherwise.
fn sync_ticker(state: &SharedState, before: &TimerState, after: &TimerState, ticking: bool) {
    let ticker = state.ticker();
    if !ticking {
        ticker.disarm();
        return;
    }

    let reanchored = before.running != after.running
        || before.paused != after.paused
        || before.started_at != after.started_at;
    if !reanchored && ticker.is_armed() {
        return;
    }

    let weak = Arc::downgrade(state);
    ticker.arm(TICK_PERIOD, move || {
        let weak = weak.clone();
        async move {
            match weak.upgrade() {
                Some(state) => tick_with_broadcast(&state).await,
                None => false,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::phase::VisibleQuizPhase,
        state::{
            AppState,
            state_machine::{
                TimerMode,
                tests::{configured, round},
            },
        },
    };

    async fn configured_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        let game = configured(&["A", "B"], vec![round("Main", 2, true)], 0).game;
        run_command_with_broadcast(&state, HostCommand::Apply(QuizAction::Setup(Box::new(game))))
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn commands_broadcast_the_new_view() {
        let state = configured_state().await;
        let mut public = state.public_sse().subscribe();

        let view = run_command_with_broadcast(&state, HostCommand::Apply(QuizAction::StartQuiz))
            .await
            .unwrap();
        assert_eq!(view.active_team.as_deref(), Some("A"));

        let event = public.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("quiz.state"));
        assert!(event.data.contains("\"phase\":\"playing\""));
    }

    #[tokio::test]
    async fn ticker_follows_the_countdown() {
        let state = configured_state().await;
        for action in [QuizAction::StartQuiz, QuizAction::RevealQuestion] {
            run_command_with_broadcast(&state, HostCommand::Apply(action))
                .await
                .unwrap();
        }
        assert!(!state.ticker().is_armed());

        run_command_with_broadcast(
            &state,
            HostCommand::Apply(QuizAction::PausePlayTimer(TimerMode::Resume)),
        )
        .await
        .unwrap();
        assert!(state.ticker().is_armed());

        run_command_with_broadcast(&state, HostCommand::Apply(QuizAction::RevealAnswer))
            .await
            .unwrap();
        assert!(!state.ticker().is_armed());

        let view = run_command_with_broadcast(&state, HostCommand::Revert)
            .await
            .unwrap();
        assert_eq!(view.phase, VisibleQuizPhase::Playing);
        assert!(!state.ticker().is_armed());
    }

    #[tokio::test]
    async fn revert_without_history_is_refused() {
        let state = AppState::new(AppConfig::default());
        let err = run_command_with_broadcast(&state, HostCommand::Revert)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NothingToRevert));
    }
}
