use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::state_machine::TimerMode;

/// Option picked on a multiple-choice question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectOptionRequest {
    /// Zero-based option index.
    pub index: usize,
}

/// Countdown control requested by the host.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TimerRequest {
    /// What to do with the countdown; toggles when omitted.
    #[serde(default)]
    pub mode: TimerModeInput,
}

/// Countdown control modes.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimerModeInput {
    /// Pause a running countdown, resume a paused one.
    #[default]
    Toggle,
    /// Pause.
    Pause,
    /// Resume.
    Resume,
}

impl From<TimerModeInput> for TimerMode {
    fn from(value: TimerModeInput) -> Self {
        match value {
            TimerModeInput::Toggle => TimerMode::Toggle,
            TimerModeInput::Pause => TimerMode::Pause,
            TimerModeInput::Resume => TimerMode::Resume,
        }
    }
}

/// Generic action acknowledgement used by host endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}
