use std::collections::HashSet;

use thiserror::Error;

use crate::state::{
    clock::TimerState,
    game::{
        Answer, GameState, Question, Round, RoundKind, RoundTiming, TeamName, TieBreakerBank,
        TimerSettings,
    },
    state_machine::QuizPhase,
};

/// Fewest teams a quiz can be played with.
pub const MIN_TEAMS: usize = 2;
/// Most teams a quiz can be played with.
pub const MAX_TEAMS: usize = 10;
/// Shortest accepted countdown, in seconds.
pub const MIN_ROUND_SECONDS: u32 = 5;
/// Longest accepted countdown, in seconds.
pub const MAX_ROUND_SECONDS: u32 = 600;

/// Round selected on the setup screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSetup {
    /// Identifier; generated from the position when empty.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Candidate questions, trimmed to a multiple of the team count.
    pub questions: Vec<Question>,
    /// Countdown configuration.
    pub timing: RoundTiming,
}

/// Everything the host configures before a quiz starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSetup {
    /// Team names in seating order.
    pub teams: Vec<TeamName>,
    /// Selected rounds in play order.
    pub rounds: Vec<RoundSetup>,
    /// Bank used if the final standings are tied.
    pub tie_breaker: TieBreakerBank,
}

/// Rejections raised while validating a setup. No state is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Team count outside the accepted range.
    #[error("a quiz needs between 2 and 10 teams, got {0}")]
    TeamCount(usize),
    /// Blank team name.
    #[error("team names cannot be empty")]
    EmptyTeamName,
    /// Two teams share a name.
    #[error("team `{0}` is listed twice")]
    DuplicateTeam(String),
    /// No round was selected.
    #[error("at least one round must be selected")]
    NoRounds,
    /// Countdown outside the accepted range.
    #[error("round `{round}`: {seconds}s is outside 5..=600 seconds")]
    Seconds {
        /// Round title.
        round: String,
        /// Rejected value.
        seconds: u32,
    },
    /// Multiple-choice question whose answer index points past its options.
    #[error("round `{round}` question {question}: answer index {index} is out of range")]
    AnswerIndex {
        /// Round title.
        round: String,
        /// Zero-based question position.
        question: usize,
        /// Rejected index.
        index: usize,
    },
}

/// Drop trailing questions so every team gets the same number of turns.
pub fn trim_questions_for_teams(mut questions: Vec<Question>, team_count: usize) -> Vec<Question> {
    if team_count == 0 {
        return questions;
    }
    let usable = questions.len() / team_count * team_count;
    questions.truncate(usable);
    questions
}

fn check_seconds(round: &str, seconds: u32) -> Result<(), SetupError> {
    if (MIN_ROUND_SECONDS..=MAX_ROUND_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(SetupError::Seconds {
            round: round.to_string(),
            seconds,
        })
    }
}

fn check_questions(round: &str, questions: &[Question]) -> Result<(), SetupError> {
    for (position, question) in questions.iter().enumerate() {
        let Answer::Choice {
            options,
            answer_index,
        } = &question.answer
        else {
            continue;
        };
        if *answer_index >= options.len() {
            return Err(SetupError::AnswerIndex {
                round: round.to_string(),
                question: position,
                index: *answer_index,
            });
        }
    }
    Ok(())
}

impl QuizSetup {
    /// Check team and round constraints.
    pub fn validate(&self) -> Result<(), SetupError> {
        if !(MIN_TEAMS..=MAX_TEAMS).contains(&self.teams.len()) {
            return Err(SetupError::TeamCount(self.teams.len()));
        }
        let mut seen = HashSet::new();
        for team in &self.teams {
            let name = team.trim();
            if name.is_empty() {
                return Err(SetupError::EmptyTeamName);
            }
            if !seen.insert(name) {
                return Err(SetupError::DuplicateTeam(name.to_string()));
            }
        }

        if self.rounds.is_empty() {
            return Err(SetupError::NoRounds);
        }
        for round in &self.rounds {
            check_seconds(&round.title, round.timing.seconds)?;
            if round.timing.pass_on {
                check_seconds(&round.title, round.timing.pass_seconds)?;
            }
            check_questions(&round.title, &round.questions)?;
        }

        if let Some(seconds) = self.tie_breaker.time_limit_seconds {
            check_seconds(&self.tie_breaker.title, seconds)?;
        }
        check_questions(&self.tie_breaker.title, &self.tie_breaker.questions)
    }

    /// Validate and build the initial game state.
    ///
    /// Rounds left without questions after trimming are dropped. When no round remains the
    /// quiz is finished straight away with every team sharing the win.
    pub fn into_game(self) -> Result<GameState, SetupError> {
        self.validate()?;

        let teams: Vec<TeamName> = self.teams.iter().map(|team| team.trim().to_string()).collect();
        let mut rounds = Vec::new();
        let mut timer_settings = TimerSettings::default();
        for (position, round) in self.rounds.into_iter().enumerate() {
            let questions = trim_questions_for_teams(round.questions, teams.len());
            if questions.is_empty() {
                continue;
            }
            let id = if round.id.trim().is_empty() {
                format!("round-{}", position + 1)
            } else {
                round.id
            };
            timer_settings.per_round.push(round.timing);
            rounds.push(Round {
                id,
                title: round.title,
                kind: RoundKind::Standard,
                questions,
                teams_to_use: teams.clone(),
            });
        }

        let (phase, winner_teams) = if rounds.is_empty() {
            (QuizPhase::Finished, teams.clone())
        } else {
            (QuizPhase::NotStarted, Vec::new())
        };
        let first_seconds = timer_settings.for_round(0).seconds;

        Ok(GameState {
            scores: teams.iter().map(|team| (team.clone(), 0)).collect(),
            alive_teams: teams.clone(),
            teams,
            rounds,
            current_round_index: 0,
            current_question: 0,
            turn: 0,
            timer: TimerState::stopped_at(first_seconds),
            phase,
            winner_teams,
            timer_settings,
            tie_base_scores: Default::default(),
            tied_teams: Vec::new(),
            tie_breaker: self.tie_breaker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: usize) -> Question {
        Question {
            prompt: format!("Question {n}"),
            media_url: None,
            answer: Answer::Text {
                answer: format!("Answer {n}"),
            },
            points: None,
        }
    }

    fn round(title: &str, count: usize) -> RoundSetup {
        RoundSetup {
            id: String::new(),
            title: title.into(),
            questions: (0..count).map(question).collect(),
            timing: RoundTiming::default(),
        }
    }

    fn setup(teams: &[&str], rounds: Vec<RoundSetup>) -> QuizSetup {
        QuizSetup {
            teams: teams.iter().map(|team| team.to_string()).collect(),
            rounds,
            tie_breaker: TieBreakerBank::default(),
        }
    }

    #[test]
    fn questions_are_trimmed_to_equal_turns() {
        let trimmed = trim_questions_for_teams((0..7).map(question).collect(), 3);
        assert_eq!(trimmed.len(), 6);
        assert_eq!(trimmed[5].prompt, "Question 5");
    }

    #[test]
    fn builds_game_with_zero_scores_and_full_rosters() {
        let game = setup(&["Red", "Blue"], vec![round("General", 5)])
            .into_game()
            .unwrap();
        assert_eq!(game.phase, QuizPhase::NotStarted);
        assert_eq!(game.rounds.len(), 1);
        assert_eq!(game.rounds[0].questions.len(), 4);
        assert_eq!(game.rounds[0].id, "round-1");
        assert_eq!(game.rounds[0].teams_to_use, vec!["Red", "Blue"]);
        assert_eq!(game.score_of("Red"), 0);
        assert_eq!(game.alive_teams, game.teams);
        assert_eq!(game.timer.time_left, Some(30));
    }

    #[test]
    fn rounds_emptied_by_trimming_are_dropped() {
        let game = setup(
            &["A", "B", "C"],
            vec![round("Tiny", 2), round("Main", 3)],
        )
        .into_game()
        .unwrap();
        assert_eq!(game.rounds.len(), 1);
        assert_eq!(game.rounds[0].title, "Main");
        assert_eq!(game.timer_settings.per_round.len(), 1);
    }

    #[test]
    fn no_usable_round_finishes_with_shared_win() {
        let game = setup(&["A", "B", "C"], vec![round("Tiny", 1)])
            .into_game()
            .unwrap();
        assert_eq!(game.phase, QuizPhase::Finished);
        assert_eq!(game.winner_teams, vec!["A", "B", "C"]);
    }

    #[test]
    fn rejects_team_counts_outside_range() {
        let err = setup(&["Solo"], vec![round("R", 2)]).into_game().unwrap_err();
        assert_eq!(err, SetupError::TeamCount(1));

        let many: Vec<String> = (0..11).map(|i| format!("T{i}")).collect();
        let names: Vec<&str> = many.iter().map(String::as_str).collect();
        let err = setup(&names, vec![round("R", 2)]).validate().unwrap_err();
        assert_eq!(err, SetupError::TeamCount(11));
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        let err = setup(&["A", " A "], vec![round("R", 2)]).validate().unwrap_err();
        assert_eq!(err, SetupError::DuplicateTeam("A".into()));

        let err = setup(&["A", "  "], vec![round("R", 2)]).validate().unwrap_err();
        assert_eq!(err, SetupError::EmptyTeamName);
    }

    #[test]
    fn rejects_out_of_range_seconds() {
        let mut slow = round("Slow", 2);
        slow.timing.seconds = 601;
        let err = setup(&["A", "B"], vec![slow]).validate().unwrap_err();
        assert!(matches!(err, SetupError::Seconds { seconds: 601, .. }));
    }

    #[test]
    fn rejects_answer_index_past_options() {
        let mut bad = round("Choice", 2);
        bad.questions[1].answer = Answer::Choice {
            options: vec!["x".into(), "y".into()],
            answer_index: 2,
        };
        let err = setup(&["A", "B"], vec![bad]).validate().unwrap_err();
        assert!(matches!(err, SetupError::AnswerIndex { question: 1, index: 2, .. }));
    }

    #[test]
    fn requires_a_round() {
        let err = setup(&["A", "B"], vec![]).validate().unwrap_err();
        assert_eq!(err, SetupError::NoRounds);
    }
}
