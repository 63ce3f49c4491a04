use serde::{Deserialize, Serialize};

use crate::state::{game::GameState, state_machine::QuizPhase};

/// Presentation flags of the host screen, snapshotted alongside the game state so that undo
/// restores exactly what was displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiFlags {
    /// Correct answer is displayed.
    pub show_answer: bool,
    /// Answer was revealed by the host or by pass exhaustion.
    pub answered: bool,
    /// Option picked on a multiple-choice question.
    pub selected_option: Option<usize>,
    /// Roster indices that passed the active question, in pass order.
    pub passed_teams: Vec<usize>,
    /// Roster index of the team that held the question first.
    pub original_turn: usize,
    /// Countdown reached zero before the answer was shown.
    pub time_up: bool,
    /// Question text is visible.
    pub question_revealed: bool,
    /// Round summary is displayed.
    pub show_round_complete: bool,
    /// Index of the round whose summary is displayed.
    pub last_completed_round_index: Option<usize>,
    /// Winner celebration is displayed.
    pub show_confetti: bool,
}

impl UiFlags {
    /// Flags matching a freshly loaded state.
    pub fn for_state(game: &GameState) -> Self {
        let mut flags = Self {
            original_turn: game.turn,
            ..Self::default()
        };
        match game.phase {
            QuizPhase::RoundComplete => {
                flags.show_round_complete = true;
                flags.last_completed_round_index = Some(game.current_round_index);
            }
            QuizPhase::Finished => flags.show_confetti = true,
            _ => {}
        }
        flags
    }

    /// Clear per-question flags when a new question becomes active for `turn`.
    pub fn reset_question(&mut self, turn: usize) {
        self.show_answer = false;
        self.answered = false;
        self.selected_option = None;
        self.passed_teams.clear();
        self.original_turn = turn;
        self.time_up = false;
        self.question_revealed = false;
    }

    /// The active question has been passed at least once.
    pub fn is_pass_on(&self) -> bool {
        !self.passed_teams.is_empty()
    }
}
