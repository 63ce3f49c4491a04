//! Upgrade of records written before `schema_version` existed.
//!
//! Those records use camelCase keys, a single `questions` list with separate `tiebreaker` and
//! `finalTiebreaker` lists, `started`/`round`/`tieIntro` flags instead of a phase, and timings
//! split between a `perRound` array and a `perRoundMap` keyed by round id.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    dao::models::{HistoryRecord, StateRecord},
    state::{
        clock::TimerState,
        game::{
            Answer, DEFAULT_PASS_SECONDS, DEFAULT_ROUND_SECONDS, GameState, Question, Round,
            RoundKind, RoundTiming, TIE_BREAKER_DEFAULT_TITLE, TIE_BREAKER_ROUND_ID, TeamName,
            TimerSettings,
        },
        history::HistoryEntry,
        scoring::tied_leaders,
        state_machine::QuizPhase,
        ui::UiFlags,
    },
};

/// Decode a persisted state record, upgrading the legacy layout when needed.
pub fn state_from_value(value: Value) -> Result<GameState, serde_json::Error> {
    if value.get("schema_version").is_some() {
        return serde_json::from_value::<StateRecord>(value).map(|record| record.game);
    }
    serde_json::from_value::<LegacyState>(value).map(LegacyState::into_game)
}

/// Decode a persisted history record, upgrading the legacy layout when needed.
pub fn history_from_value(value: Value) -> Result<Vec<HistoryEntry>, serde_json::Error> {
    match value {
        Value::Array(_) => {
            let entries = serde_json::from_value::<Vec<LegacyHistoryEntry>>(value)?;
            Ok(entries
                .into_iter()
                .map(LegacyHistoryEntry::into_entry)
                .collect())
        }
        other => serde_json::from_value::<HistoryRecord>(other).map(|record| record.entries),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyQuestion {
    question: String,
    options: Option<Vec<String>>,
    answer_index: Option<usize>,
    answer: Option<String>,
    points: Option<u32>,
    media: Option<String>,
}

impl LegacyQuestion {
    fn into_question(self) -> Question {
        let answer = match (self.options, self.answer_index) {
            (Some(options), Some(answer_index)) if answer_index < options.len() => {
                Answer::Choice {
                    options,
                    answer_index,
                }
            }
            _ => Answer::Text {
                answer: self.answer.unwrap_or_default(),
            },
        };
        Question {
            prompt: self.question,
            media_url: self.media.filter(|url| !url.trim().is_empty()),
            answer,
            points: self.points,
        }
    }
}

fn convert_questions(questions: Vec<LegacyQuestion>) -> Vec<Question> {
    questions
        .into_iter()
        .map(LegacyQuestion::into_question)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyRound {
    id: String,
    title: String,
    questions: Vec<LegacyQuestion>,
    teams_to_use: Option<Vec<TeamName>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyTimer {
    running: bool,
    paused: bool,
    pass_mode: bool,
    time_left: Option<i64>,
    started_at: Option<f64>,
}

impl LegacyTimer {
    fn into_timer(self) -> TimerState {
        let started_at = self
            .started_at
            .filter(|millis| millis.is_finite() && *millis > 0.0)
            .map(|millis| millis as u64);
        TimerState {
            running: self.running && started_at.is_some(),
            paused: self.paused || !self.running,
            pass_mode: self.pass_mode,
            time_left: self
                .time_left
                .map(|seconds| u32::try_from(seconds.max(0)).unwrap_or(u32::MAX)),
            started_at: if self.running { started_at } else { None },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyRoundTiming {
    time: Option<u32>,
    pass_on: bool,
    pass_time: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyTimerSettings {
    per_round: Vec<Option<u32>>,
    pass_on: Option<u32>,
    per_round_map: IndexMap<String, LegacyRoundTiming>,
}

impl LegacyTimerSettings {
    fn timing_for(&self, index: usize, round_id: &str) -> RoundTiming {
        let seconds = self.per_round.get(index).copied().flatten();
        match self.per_round_map.get(round_id) {
            Some(entry) => RoundTiming {
                seconds: entry.time.or(seconds).unwrap_or(DEFAULT_ROUND_SECONDS),
                pass_on: entry.pass_on,
                pass_seconds: entry.pass_time.unwrap_or(DEFAULT_PASS_SECONDS),
            },
            // before per-round flags existed every round allowed passing
            None => RoundTiming {
                seconds: seconds.unwrap_or(DEFAULT_ROUND_SECONDS),
                pass_on: true,
                pass_seconds: self.pass_on.unwrap_or(DEFAULT_PASS_SECONDS),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyState {
    teams: Vec<TeamName>,
    alive_teams: Option<Vec<TeamName>>,
    started: bool,
    current_question: usize,
    scores: IndexMap<TeamName, i64>,
    turn: usize,
    round: Option<String>,
    timer: Option<LegacyTimer>,
    winner_teams: Vec<TeamName>,
    tie_intro: Option<String>,
    rounds_tie_teams: Vec<TeamName>,
    tie_base_scores: IndexMap<TeamName, i64>,
    rounds: Vec<LegacyRound>,
    current_round_index: usize,
    questions: Vec<LegacyQuestion>,
    tiebreaker: Vec<LegacyQuestion>,
    final_tiebreaker: Vec<LegacyQuestion>,
    timer_settings: LegacyTimerSettings,
}

fn clamp_scores(scores: IndexMap<TeamName, i64>) -> IndexMap<TeamName, u32> {
    scores
        .into_iter()
        .map(|(team, score)| (team, u32::try_from(score.max(0)).unwrap_or(u32::MAX)))
        .collect()
}

impl LegacyState {
    fn into_game(self) -> GameState {
        let LegacyState {
            teams,
            alive_teams,
            started,
            current_question,
            scores,
            turn,
            round,
            timer,
            winner_teams,
            tie_intro,
            rounds_tie_teams,
            tie_base_scores,
            rounds: legacy_rounds,
            current_round_index,
            questions,
            tiebreaker,
            final_tiebreaker,
            timer_settings,
        } = self;

        let alive_teams = alive_teams
            .filter(|alive| !alive.is_empty())
            .unwrap_or_else(|| teams.clone());
        let mut scores = clamp_scores(scores);
        for team in &teams {
            scores.entry(team.clone()).or_insert(0);
        }
        let round_label = round.unwrap_or_else(|| "main".to_string());

        let mut rounds = Vec::new();
        let mut settings = TimerSettings::default();
        let mut current_round_index = current_round_index;
        if legacy_rounds.is_empty() {
            // single-round layout: the main list, optionally followed by the active tie list
            let timing = timer_settings.timing_for(0, "main");
            if !questions.is_empty() {
                rounds.push(Round {
                    id: "main".into(),
                    title: "Main Round".into(),
                    kind: RoundKind::Standard,
                    questions: convert_questions(questions),
                    teams_to_use: teams.clone(),
                });
                settings.per_round.push(timing);
            }
            current_round_index = 0;
            let tie_questions = match round_label.as_str() {
                "tiebreaker" => Some(tiebreaker),
                "final" => Some(final_tiebreaker),
                _ => None,
            };
            if let Some(tie_questions) = tie_questions {
                rounds.push(Round {
                    id: TIE_BREAKER_ROUND_ID.into(),
                    title: TIE_BREAKER_DEFAULT_TITLE.into(),
                    kind: RoundKind::TieBreaker,
                    questions: convert_questions(tie_questions),
                    teams_to_use: alive_teams.clone(),
                });
                settings.per_round.push(timing);
                current_round_index = rounds.len() - 1;
            }
        } else {
            for (index, legacy) in legacy_rounds.into_iter().enumerate() {
                let is_tie_breaker = legacy.id == TIE_BREAKER_ROUND_ID;
                let teams_to_use = legacy
                    .teams_to_use
                    .filter(|roster| !roster.is_empty())
                    .unwrap_or_else(|| {
                        if is_tie_breaker {
                            alive_teams.clone()
                        } else {
                            teams.clone()
                        }
                    });
                settings
                    .per_round
                    .push(timer_settings.timing_for(index, &legacy.id));
                rounds.push(Round {
                    title: if legacy.title.is_empty() && is_tie_breaker {
                        TIE_BREAKER_DEFAULT_TITLE.into()
                    } else {
                        legacy.title
                    },
                    id: legacy.id,
                    kind: if is_tie_breaker {
                        RoundKind::TieBreaker
                    } else {
                        RoundKind::Standard
                    },
                    questions: convert_questions(legacy.questions),
                    teams_to_use,
                });
            }
            current_round_index = current_round_index.min(rounds.len().saturating_sub(1));
        }

        let phase = match rounds.get(current_round_index) {
            _ if !started => QuizPhase::NotStarted,
            _ if round_label == "finished" => QuizPhase::Finished,
            _ if tie_intro.is_some() => QuizPhase::TieIntro,
            None => QuizPhase::NotStarted,
            Some(active) if active.is_tie_breaker() => QuizPhase::TieBreaker,
            Some(active) if current_question >= active.questions.len() => {
                QuizPhase::RoundComplete
            }
            Some(_) => QuizPhase::Playing,
        };

        let tied_teams = if phase == QuizPhase::TieIntro && rounds_tie_teams.is_empty() {
            tied_leaders(&alive_teams, &scores)
        } else {
            rounds_tie_teams
        };
        let timer = timer
            .map(LegacyTimer::into_timer)
            .unwrap_or_else(|| TimerState::stopped_at(settings.for_round(current_round_index).seconds));

        GameState {
            teams,
            alive_teams,
            scores,
            rounds,
            current_round_index,
            current_question,
            turn,
            timer,
            phase,
            winner_teams,
            timer_settings: settings,
            tie_base_scores: clamp_scores(tie_base_scores),
            tied_teams,
            tie_breaker: Default::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyUi {
    show_answer: bool,
    answered: bool,
    selected_option: Option<usize>,
    passed_teams: Vec<usize>,
    original_turn: usize,
    time_up: bool,
    question_revealed: bool,
    show_round_complete_screen: bool,
    last_completed_round_index: Option<usize>,
    show_confetti: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyHistoryEntry {
    quiz_state: LegacyState,
    #[serde(default)]
    ui: LegacyUi,
    #[serde(default)]
    ts: f64,
    #[serde(default)]
    reason: String,
}

impl LegacyHistoryEntry {
    fn into_entry(self) -> HistoryEntry {
        let ui = self.ui;
        HistoryEntry {
            game: self.quiz_state.into_game(),
            ui: UiFlags {
                show_answer: ui.show_answer,
                answered: ui.answered,
                selected_option: ui.selected_option,
                passed_teams: ui.passed_teams,
                original_turn: ui.original_turn,
                time_up: ui.time_up,
                question_revealed: ui.question_revealed,
                show_round_complete: ui.show_round_complete_screen,
                last_completed_round_index: ui.last_completed_round_index,
                show_confetti: ui.show_confetti,
            },
            timestamp: if self.ts.is_finite() && self.ts > 0.0 {
                self.ts as u64
            } else {
                0
            },
            reason: self.reason,
        }
    }
}
