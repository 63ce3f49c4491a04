use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::QuizPhase;

/// Quiz phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleQuizPhase {
    /// Teams and rounds are being configured, or the quiz awaits its start.
    Setup,
    /// A question round is in play.
    Playing,
    /// Round summary.
    RoundComplete,
    /// Tie announced, tie-breaker not started yet.
    TieIntro,
    /// Tie-breaker round in play.
    TieBreaker,
    /// Winners declared.
    Finished,
}

impl From<QuizPhase> for VisibleQuizPhase {
    fn from(value: QuizPhase) -> Self {
        match value {
            QuizPhase::NotStarted => VisibleQuizPhase::Setup,
            QuizPhase::Playing => VisibleQuizPhase::Playing,
            QuizPhase::RoundComplete => VisibleQuizPhase::RoundComplete,
            QuizPhase::TieIntro => VisibleQuizPhase::TieIntro,
            QuizPhase::TieBreaker => VisibleQuizPhase::TieBreaker,
            QuizPhase::Finished => VisibleQuizPhase::Finished,
        }
    }
}
