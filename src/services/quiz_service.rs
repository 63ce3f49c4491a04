use tracing::info;

use crate::{
    dto::{
        host::{ActionResponse, TimerRequest},
        quiz::QuizView,
        setup::QuizSetupRequest,
    },
    error::ServiceError,
    state::{
        SharedState,
        state_machine::QuizAction,
        transitions::{HostCommand, run_command_with_broadcast},
    },
};

async fn apply(state: &SharedState, action: QuizAction) -> Result<QuizView, ServiceError> {
    run_command_with_broadcast(state, HostCommand::Apply(action)).await
}

/// Install a new quiz configuration.
pub async fn setup_quiz(
    state: &SharedState,
    payload: QuizSetupRequest,
) -> Result<QuizView, ServiceError> {
    let game = payload.into_setup(state.config()).into_game()?;
    info!(
        teams = game.teams.len(),
        rounds = game.rounds.len(),
        "quiz configured"
    );
    apply(state, QuizAction::Setup(Box::new(game))).await
}

/// Enter the first round.
pub async fn start_quiz(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::StartQuiz).await
}

/// Show the active question with a paused countdown.
pub async fn reveal_question(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::RevealQuestion).await
}

/// Record an option pick and show the answer.
pub async fn select_option(state: &SharedState, index: usize) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::SelectOption(index)).await
}

/// Pass the active question to the next team.
pub async fn pass(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::Pass).await
}

/// Award the team on turn and advance.
pub async fn mark_correct(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::MarkCorrect).await
}

/// Show the answer without scoring.
pub async fn reveal_answer(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::RevealAnswer).await
}

/// Advance without scoring.
pub async fn next_question(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::NextQuestion).await
}

/// Pause, resume or toggle the countdown.
pub async fn pause_play_timer(
    state: &SharedState,
    request: TimerRequest,
) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::PausePlayTimer(request.mode.into())).await
}

/// Leave the round summary.
pub async fn continue_after_round(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::ContinueAfterRoundComplete).await
}

/// Start the announced tie-breaker.
pub async fn start_tie_breaker(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::StartTieBreaker).await
}

/// Back to setup with the same teams and rounds.
pub async fn go_home(state: &SharedState) -> Result<QuizView, ServiceError> {
    apply(state, QuizAction::GoHome).await
}

/// Discard the quiz, its history and the persisted records.
pub async fn restart(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    apply(state, QuizAction::Restart).await?;
    info!("quiz restarted");
    Ok(ActionResponse {
        message: "quiz restarted".into(),
    })
}

/// Undo the most recent host action.
pub async fn revert(state: &SharedState) -> Result<QuizView, ServiceError> {
    run_command_with_broadcast(state, HostCommand::Revert).await
}
