use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{format_timestamp_ms, phase::VisibleQuizPhase},
    state::{
        engine::QuizEngine,
        game::{Answer, GameState, MediaKind, RoundKind},
        scoring::leaderboard,
        state_machine::{QuizPhase, QuizSession},
    },
};

/// Read-only projection of the quiz consumed by the display and host screens.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizView {
    /// Phase as shown to the audience.
    pub phase: VisibleQuizPhase,
    /// Teams in seating order with their scores.
    pub teams: Vec<TeamScore>,
    /// Teams playing the current round, by score then seating order.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Absent before the quiz starts and once it is finished.
    pub round: Option<RoundView>,
    /// Absent outside a question.
    pub question: Option<QuestionView>,
    /// Team on turn for the active question.
    pub active_team: Option<String>,
    /// Stored countdown state.
    pub timer: TimerView,
    /// Remaining seconds right now, accounting for a running countdown.
    pub effective_time_left: u32,
    /// The active question was passed on at least once.
    pub is_pass_on: bool,
    /// The countdown reached zero on the active question.
    pub time_up: bool,
    pub flags: FlagsView,
    /// Tied teams while the tie-breaker is announced.
    pub tied_teams: Vec<String>,
    /// Highest scorers once the quiz is finished.
    pub winners: Vec<String>,
    /// More than one team won.
    pub shared_win: bool,
    /// An undo snapshot is available.
    pub can_revert: bool,
    /// Most recent snapshot, i.e. what a revert would undo.
    pub last_action: Option<HistorySummary>,
}

/// Team and its score.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamScore {
    pub name: String,
    pub score: u32,
}

/// Leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub team: String,
    pub score: u32,
    /// First row with a positive score.
    pub top: bool,
}

/// Round currently in play.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    pub index: usize,
    /// "Round 2", or "Tie-Breaker".
    pub label: String,
    pub title: String,
    pub kind: RoundKind,
    pub question_count: usize,
    pub pass_on: bool,
    pub seconds: u32,
    pub pass_seconds: u32,
}

/// Question currently in play. The answer is only included once shown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    pub index: usize,
    /// "Question 3 of 8".
    pub progress: String,
    /// Hidden until the host reveals the question.
    pub prompt: Option<String>,
    pub media_url: Option<String>,
    /// Derived from the media URL extension.
    pub media_kind: Option<MediaKind>,
    /// Present for multiple-choice questions.
    pub options: Option<Vec<String>>,
    /// Points a first-team correct answer is worth.
    pub points: u32,
    /// Correct answer text, once the answer is shown.
    pub answer: Option<String>,
    /// Correct option, once the answer is shown.
    pub answer_index: Option<usize>,
}

/// Countdown state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimerView {
    pub running: bool,
    pub paused: bool,
    /// Counting down a pass-on window.
    pub pass_mode: bool,
    /// Stored seconds left, without the running countdown applied.
    pub time_left: Option<u32>,
}

/// Host screen flags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlagsView {
    pub question_revealed: bool,
    pub show_answer: bool,
    pub answered: bool,
    pub selected_option: Option<usize>,
    /// Teams that passed the active question, in pass order.
    pub passed_teams: Vec<String>,
    /// Team that first held the active question.
    pub original_team: Option<String>,
    pub show_round_complete: bool,
    pub last_completed_round_index: Option<usize>,
    pub show_confetti: bool,
}

/// Snapshot label and time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistorySummary {
    /// Action that produced the snapshot.
    pub reason: String,
    /// RFC 3339.
    pub at: String,
    /// Snapshots available for undo.
    pub depth: usize,
}

impl QuizView {
    /// Project the engine's current session.
    pub fn from_engine(engine: &QuizEngine) -> Self {
        let history = engine.history();
        let last_action = history.last().map(|entry| HistorySummary {
            reason: entry.reason.clone(),
            at: format_timestamp_ms(entry.timestamp),
            depth: history.len(),
        });
        let mut view = Self::project(engine.session(), engine.now_ms());
        view.can_revert = engine.can_revert();
        view.last_action = last_action;
        view
    }

    /// Project `session` at `now_ms`, without history information.
    pub fn project(session: &QuizSession, now_ms: u64) -> Self {
        let game = &session.game;
        let ui = &session.ui;
        let answering = game.phase.is_answering();

        let teams = game
            .teams
            .iter()
            .map(|team| TeamScore {
                name: team.clone(),
                score: game.score_of(team),
            })
            .collect();

        let mut top_taken = false;
        let leaderboard = leaderboard(game.scoring_roster(), &game.scores)
            .into_iter()
            .map(|standing| {
                let top = !top_taken && standing.score > 0;
                top_taken = true;
                LeaderboardEntry {
                    team: standing.team,
                    score: standing.score,
                    top,
                }
            })
            .collect();

        let roster = game.teams_to_use();
        let team_at = |index: usize| roster.get(index).cloned();

        Self {
            phase: game.phase.into(),
            teams,
            leaderboard,
            round: round_view(game),
            question: if answering {
                question_view(session)
            } else {
                None
            },
            active_team: if answering {
                game.active_team().cloned()
            } else {
                None
            },
            timer: TimerView {
                running: game.timer.running,
                paused: game.timer.paused,
                pass_mode: game.timer.pass_mode,
                time_left: game.timer.time_left,
            },
            effective_time_left: game.timer.remaining(game.timer_fallback(), now_ms),
            is_pass_on: ui.is_pass_on(),
            time_up: ui.time_up,
            flags: FlagsView {
                question_revealed: ui.question_revealed,
                show_answer: ui.show_answer,
                answered: ui.answered,
                selected_option: ui.selected_option,
                passed_teams: ui.passed_teams.iter().filter_map(|&i| team_at(i)).collect(),
                original_team: team_at(ui.original_turn),
                show_round_complete: ui.show_round_complete,
                last_completed_round_index: ui.last_completed_round_index,
                show_confetti: ui.show_confetti,
            },
            tied_teams: if game.phase == QuizPhase::TieIntro {
                game.tied_teams.clone()
            } else {
                Vec::new()
            },
            winners: game.winner_teams.clone(),
            shared_win: game.phase == QuizPhase::Finished && game.winner_teams.len() > 1,
            can_revert: false,
            last_action: None,
        }
    }
}

fn round_view(game: &GameState) -> Option<RoundView> {
    let round = game.current_round()?;
    let timing = game.round_timing();
    let label = if round.is_tie_breaker() {
        "Tie-Breaker".to_string()
    } else {
        format!("Round {}", game.current_round_index + 1)
    };
    Some(RoundView {
        index: game.current_round_index,
        label,
        title: round.title.clone(),
        kind: round.kind,
        question_count: round.questions.len(),
        pass_on: timing.pass_on,
        seconds: timing.seconds,
        pass_seconds: timing.pass_seconds,
    })
}

fn question_view(session: &QuizSession) -> Option<QuestionView> {
    let game = &session.game;
    let ui = &session.ui;
    let question = game.current_question()?;
    let media = question.media();
    let revealed = ui.question_revealed || ui.show_answer;

    Some(QuestionView {
        index: game.current_question,
        progress: format!(
            "Question {} of {}",
            game.current_question + 1,
            game.question_count()
        ),
        prompt: revealed.then(|| question.prompt.clone()),
        media_url: media
            .filter(|_| revealed)
            .map(|(url, _)| url.to_string()),
        media_kind: media.filter(|_| revealed).map(|(_, kind)| kind),
        options: question
            .options()
            .filter(|_| revealed)
            .map(<[String]>::to_vec),
        points: question.points(),
        answer: ui
            .show_answer
            .then(|| question.correct_answer_text().to_string()),
        answer_index: match &question.answer {
            Answer::Choice { answer_index, .. } if ui.show_answer => {
                Some(*answer_index)
            }
            _ => None,
        },
    })
}
