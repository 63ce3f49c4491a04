use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{clock::TimerState, state_machine::QuizPhase};

/// Points awarded when a question does not carry its own value.
pub const DEFAULT_POINTS: u32 = 10;
/// Points awarded to a team answering a question passed on to it.
pub const PASS_ON_POINTS: u32 = 5;
/// Base countdown used when a round has no explicit timing.
pub const DEFAULT_ROUND_SECONDS: u32 = 30;
/// Pass-on countdown used when a round has no explicit timing.
pub const DEFAULT_PASS_SECONDS: u32 = 5;
/// Identifier given to the synthesized tie-breaker round.
pub const TIE_BREAKER_ROUND_ID: &str = "tiebreaker";
/// Title used when the tie-breaker bank does not provide one.
pub const TIE_BREAKER_DEFAULT_TITLE: &str = "Tie-Breaker Round";

/// Team names double as identifiers; they are unique within a quiz.
pub type TeamName = String;

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt text; may itself be a media URL.
    pub prompt: String,
    /// Optional media displayed alongside the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Expected answer.
    pub answer: Answer,
    /// Point override; [`DEFAULT_POINTS`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

/// Expected answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Multiple choice: the correct option is `options[answer_index]`.
    Choice {
        /// Options shown to the teams.
        options: Vec<String>,
        /// Index of the correct option.
        answer_index: usize,
    },
    /// Free-text answer read out by the host.
    Text {
        /// Answer text.
        answer: String,
    },
}

/// Kind of media a question refers to, derived from the URL extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Audio clip.
    Audio,
    /// Video clip.
    Video,
}

impl MediaKind {
    /// Classify a URL by its file extension, ignoring query string and fragment.
    pub fn classify(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let (_, extension) = path.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" => Some(MediaKind::Image),
            "mp3" | "wav" | "ogg" | "aac" => Some(MediaKind::Audio),
            "mp4" | "webm" | "mov" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl Question {
    /// Points for a first-hand correct answer.
    pub fn points(&self) -> u32 {
        self.points.unwrap_or(DEFAULT_POINTS)
    }

    /// Options of a multiple-choice question.
    pub fn options(&self) -> Option<&[String]> {
        match &self.answer {
            Answer::Choice { options, .. } => Some(options),
            Answer::Text { .. } => None,
        }
    }

    /// Text of the correct answer.
    pub fn correct_answer_text(&self) -> &str {
        match &self.answer {
            Answer::Choice {
                options,
                answer_index,
            } => options.get(*answer_index).map(String::as_str).unwrap_or(""),
            Answer::Text { answer } => answer,
        }
    }

    /// Media attached to the question: the explicit URL, or the prompt when it is a media link.
    pub fn media(&self) -> Option<(&str, MediaKind)> {
        if let Some(url) = self.media_url.as_deref() {
            return MediaKind::classify(url).map(|kind| (url, kind));
        }
        MediaKind::classify(self.prompt.trim()).map(|kind| (self.prompt.trim(), kind))
    }
}

/// Distinguishes configured rounds from the synthesized tie-breaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    /// Round selected at setup.
    #[default]
    Standard,
    /// Round created to settle a tie after the last configured round.
    TieBreaker,
}

/// A round of questions played by a roster of teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Stable identifier of the round.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Configured round or tie-breaker.
    #[serde(default)]
    pub kind: RoundKind,
    /// Ordered question list.
    pub questions: Vec<Question>,
    /// Teams taking turns in this round, in seating order.
    pub teams_to_use: Vec<TeamName>,
}

impl Round {
    /// Whether this is the synthesized tie-breaker round.
    pub fn is_tie_breaker(&self) -> bool {
        self.kind == RoundKind::TieBreaker
    }
}

/// Countdown configuration for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTiming {
    /// Base countdown in seconds.
    pub seconds: u32,
    /// Whether questions may be passed on to the next team.
    pub pass_on: bool,
    /// Countdown in seconds once a question has been passed on.
    pub pass_seconds: u32,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_ROUND_SECONDS,
            pass_on: false,
            pass_seconds: DEFAULT_PASS_SECONDS,
        }
    }
}

/// Per-round timing, indexed like [`GameState::rounds`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Timing of each round.
    pub per_round: Vec<RoundTiming>,
}

impl TimerSettings {
    /// Timing for a round, falling back to the defaults for unknown indices.
    pub fn for_round(&self, index: usize) -> RoundTiming {
        self.per_round.get(index).copied().unwrap_or_default()
    }

    /// Set the timing of a round, growing the table if needed.
    pub fn set(&mut self, index: usize, timing: RoundTiming) {
        if self.per_round.len() <= index {
            self.per_round.resize(index + 1, RoundTiming::default());
        }
        self.per_round[index] = timing;
    }
}

/// Question bank used to synthesize tie-breaker rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakerBank {
    /// Title of the synthesized round.
    #[serde(default = "default_tie_breaker_title")]
    pub title: String,
    /// Base countdown of the tie-breaker round.
    #[serde(default)]
    pub time_limit_seconds: Option<u32>,
    /// Whether tie-breaker questions may be passed on.
    #[serde(default)]
    pub pass_on: bool,
    /// Pass-on countdown of the tie-breaker round.
    #[serde(default = "default_pass_seconds")]
    pub pass_seconds: u32,
    /// Available questions, used in order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Default for TieBreakerBank {
    fn default() -> Self {
        Self {
            title: default_tie_breaker_title(),
            time_limit_seconds: None,
            pass_on: false,
            pass_seconds: DEFAULT_PASS_SECONDS,
            questions: Vec::new(),
        }
    }
}

fn default_tie_breaker_title() -> String {
    TIE_BREAKER_DEFAULT_TITLE.to_string()
}

fn default_pass_seconds() -> u32 {
    DEFAULT_PASS_SECONDS
}

impl TieBreakerBank {
    /// Questions for a tie between `tied_count` teams.
    ///
    /// Two tied teams play four questions, larger ties one question per team; the count is
    /// capped by the bank size.
    pub fn derive_questions(&self, tied_count: usize) -> Vec<Question> {
        if tied_count == 0 {
            return Vec::new();
        }
        let desired = if tied_count == 2 { 4 } else { tied_count };
        self.questions
            .iter()
            .take(desired.min(self.questions.len()))
            .cloned()
            .collect()
    }

    /// Timing applied to the synthesized round.
    pub fn timing(&self) -> RoundTiming {
        RoundTiming {
            seconds: self.time_limit_seconds.unwrap_or(DEFAULT_ROUND_SECONDS),
            pass_on: self.pass_on,
            pass_seconds: self.pass_seconds,
        }
    }
}

/// Root aggregate of a quiz, persisted after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Teams in seating order.
    pub teams: Vec<TeamName>,
    /// Teams still competing; narrowed to the tied set during a tie-breaker.
    pub alive_teams: Vec<TeamName>,
    /// Cumulative score of each team.
    pub scores: IndexMap<TeamName, u32>,
    /// Rounds in play order, the tie-breaker last when present.
    pub rounds: Vec<Round>,
    /// Index of the active round.
    pub current_round_index: usize,
    /// Index of the active question; equal to the question count once the round is exhausted.
    pub current_question: usize,
    /// Index into the active round roster of the team whose turn it is.
    pub turn: usize,
    /// Countdown of the active question.
    pub timer: TimerState,
    /// High-level status.
    pub phase: QuizPhase,
    /// Declared winners; more than one means a shared win.
    pub winner_teams: Vec<TeamName>,
    /// Timing of each round.
    pub timer_settings: TimerSettings,
    /// Scores of the tied teams when the tie-breaker started.
    #[serde(default)]
    pub tie_base_scores: IndexMap<TeamName, u32>,
    /// Teams tied after the last configured round.
    #[serde(default)]
    pub tied_teams: Vec<TeamName>,
    /// Bank the tie-breaker questions are drawn from.
    #[serde(default)]
    pub tie_breaker: TieBreakerBank,
}

impl GameState {
    /// The active round, if any.
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(self.current_round_index)
    }

    /// The active question, if the round is not exhausted.
    pub fn current_question(&self) -> Option<&Question> {
        self.current_round()?.questions.get(self.current_question)
    }

    /// Question count of the active round.
    pub fn question_count(&self) -> usize {
        self.current_round().map_or(0, |round| round.questions.len())
    }

    /// Roster of the active round.
    pub fn teams_to_use(&self) -> &[TeamName] {
        match self.current_round() {
            Some(round) if !round.teams_to_use.is_empty() => &round.teams_to_use,
            _ => self.scoring_roster(),
        }
    }

    /// Team whose turn it is.
    pub fn active_team(&self) -> Option<&TeamName> {
        self.teams_to_use().get(self.turn)
    }

    /// Teams eligible to win: the alive set when present, every team otherwise.
    pub fn scoring_roster(&self) -> &[TeamName] {
        if self.alive_teams.is_empty() {
            &self.teams
        } else {
            &self.alive_teams
        }
    }

    /// Number of rounds selected at setup.
    pub fn configured_round_count(&self) -> usize {
        self.rounds
            .iter()
            .filter(|round| !round.is_tie_breaker())
            .count()
    }

    /// Index of the synthesized tie-breaker round, if one exists.
    pub fn tie_breaker_index(&self) -> Option<usize> {
        self.rounds.iter().position(Round::is_tie_breaker)
    }

    /// Timing of the active round.
    pub fn round_timing(&self) -> RoundTiming {
        self.timer_settings.for_round(self.current_round_index)
    }

    /// Seconds the countdown starts from when no explicit value is stored.
    pub fn timer_fallback(&self) -> u32 {
        let timing = self.round_timing();
        if self.timer.pass_mode {
            timing.pass_seconds
        } else {
            timing.seconds
        }
    }

    /// Score of a team, zero when unknown.
    pub fn score_of(&self, team: &str) -> u32 {
        self.scores.get(team).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_question(prompt: &str) -> Question {
        Question {
            prompt: prompt.into(),
            media_url: None,
            answer: Answer::Text {
                answer: "42".into(),
            },
            points: None,
        }
    }

    #[test]
    fn media_kind_is_detected_from_extension() {
        assert_eq!(
            MediaKind::classify("https://cdn.example/a/photo.JPG"),
            Some(MediaKind::Image)
        );
        assert_eq!(
            MediaKind::classify("https://cdn.example/clip.mp3?dl=1"),
            Some(MediaKind::Audio)
        );
        assert_eq!(MediaKind::classify("intro.webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("Which planet is red?"), None);
    }

    #[test]
    fn prompt_acting_as_media_is_reported() {
        let question = text_question("https://cdn.example/flag.png");
        assert_eq!(
            question.media(),
            Some(("https://cdn.example/flag.png", MediaKind::Image))
        );
        assert_eq!(text_question("Capital of Peru?").media(), None);
    }

    #[test]
    fn correct_answer_text_reads_choice_or_text() {
        let choice = Question {
            prompt: "2 + 2".into(),
            media_url: None,
            answer: Answer::Choice {
                options: vec!["3".into(), "4".into()],
                answer_index: 1,
            },
            points: Some(20),
        };
        assert_eq!(choice.correct_answer_text(), "4");
        assert_eq!(choice.points(), 20);
        assert_eq!(text_question("?").correct_answer_text(), "42");
        assert_eq!(text_question("?").points(), DEFAULT_POINTS);
    }

    #[test]
    fn tie_breaker_derives_four_questions_for_two_teams() {
        let bank = TieBreakerBank {
            questions: (0..6).map(|i| text_question(&format!("q{i}"))).collect(),
            ..TieBreakerBank::default()
        };
        assert_eq!(bank.derive_questions(2).len(), 4);
        assert_eq!(bank.derive_questions(3).len(), 3);
        assert_eq!(bank.derive_questions(0).len(), 0);
    }

    #[test]
    fn tie_breaker_question_count_is_capped_by_bank() {
        let bank = TieBreakerBank {
            questions: vec![text_question("only")],
            ..TieBreakerBank::default()
        };
        assert_eq!(bank.derive_questions(2).len(), 1);
        assert_eq!(bank.derive_questions(5).len(), 1);
    }

    #[test]
    fn teams_to_use_falls_back_to_alive_then_all_teams() {
        let mut game = GameState {
            teams: vec!["A".into(), "B".into(), "C".into()],
            ..GameState::default()
        };
        assert_eq!(game.teams_to_use(), ["A", "B", "C"]);

        game.alive_teams = vec!["A".into(), "C".into()];
        assert_eq!(game.teams_to_use(), ["A", "C"]);

        game.rounds.push(Round {
            id: "r1".into(),
            title: "Round 1".into(),
            kind: RoundKind::Standard,
            questions: vec![],
            teams_to_use: vec!["B".into()],
        });
        assert_eq!(game.teams_to_use(), ["B"]);
    }
}
