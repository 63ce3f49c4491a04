use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{
    game::{GameState, Question, Round, RoundKind, TIE_BREAKER_ROUND_ID, TeamName},
    scoring::{award_points, baseline, gain_winners, tied_leaders},
    turns::{self, PassOutcome},
    ui::UiFlags,
};

/// High-level phases a quiz goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    /// Teams and rounds are being configured.
    #[default]
    NotStarted,
    /// A configured round is in play.
    Playing,
    /// The round summary is displayed.
    RoundComplete,
    /// The final standings are tied and the tie-breaker is announced.
    TieIntro,
    /// The tie-breaker round is in play.
    TieBreaker,
    /// Winners have been declared.
    Finished,
}

impl QuizPhase {
    /// Phases in which a question is on screen.
    pub fn is_answering(self) -> bool {
        matches!(self, QuizPhase::Playing | QuizPhase::TieBreaker)
    }
}

/// How the host wants the countdown to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Pause a running countdown, resume a paused one.
    #[default]
    Toggle,
    /// Pause; no-op when already paused.
    Pause,
    /// Resume; no-op when already running.
    Resume,
}

/// Actions that can be applied to a quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    /// Install a freshly configured game.
    Setup(Box<GameState>),
    /// Enter the first round.
    StartQuiz,
    /// Show the active question and arm its countdown.
    RevealQuestion,
    /// Pick an option of a multiple-choice question and show the answer.
    SelectOption(usize),
    /// The team on turn passes the question on.
    Pass,
    /// The team on turn answered correctly.
    MarkCorrect,
    /// Show the answer without awarding points.
    RevealAnswer,
    /// Move on without awarding points.
    NextQuestion,
    /// Pause or resume the countdown.
    PausePlayTimer(TimerMode),
    /// Leave the round summary.
    ContinueAfterRoundComplete,
    /// Start the tie-breaker round.
    StartTieBreaker,
    /// Return to setup, keeping teams and rounds.
    GoHome,
    /// Discard everything.
    Restart,
    /// One second of countdown elapsed.
    Tick,
}

impl QuizAction {
    /// Label recorded with the history snapshot taken before this action.
    pub fn reason(&self) -> &'static str {
        match self {
            QuizAction::Setup(_) => "setup",
            QuizAction::StartQuiz => "start_quiz",
            QuizAction::RevealQuestion => "reveal_question",
            QuizAction::SelectOption(_) => "select_option",
            QuizAction::Pass => "pass",
            QuizAction::MarkCorrect => "mark_correct",
            QuizAction::RevealAnswer => "reveal_answer",
            QuizAction::NextQuestion => "next_question",
            QuizAction::PausePlayTimer(_) => "pause_play_timer",
            QuizAction::ContinueAfterRoundComplete => "continue_after_round_complete",
            QuizAction::StartTieBreaker => "start_tie_breaker",
            QuizAction::GoHome => "go_home",
            QuizAction::Restart => "restart",
            QuizAction::Tick => "tick",
        }
    }
}

/// Error returned when an action is not applicable to the current session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid action: {action} cannot be applied while in {phase:?}: {reason}")]
pub struct InvalidAction {
    /// Phase the session was in.
    pub phase: QuizPhase,
    /// Label of the rejected action.
    pub action: &'static str,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Game state plus the host screen flags; the unit that is snapshotted and restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    /// Persisted quiz state.
    pub game: GameState,
    /// Presentation flags.
    pub ui: UiFlags,
}

impl QuizSession {
    /// Session for a loaded game, with flags derived from its phase.
    pub fn from_game(game: GameState) -> Self {
        let ui = UiFlags::for_state(&game);
        Self { game, ui }
    }

    /// Compute the session resulting from `action` at `now_ms`, leaving `self` untouched.
    pub fn apply(&self, action: QuizAction, now_ms: u64) -> Result<QuizSession, InvalidAction> {
        let mut next = self.clone();
        next.transition(action, now_ms)?;
        next.refresh_time_up();
        Ok(next)
    }

    /// Whether the countdown of the active question should be ticking.
    pub fn timer_is_ticking(&self) -> bool {
        self.game.phase.is_answering() && !self.ui.show_answer && self.game.timer.is_ticking()
    }

    fn transition(&mut self, action: QuizAction, now: u64) -> Result<(), InvalidAction> {
        let phase = self.game.phase;
        let name = action.reason();
        let reject = |reason| InvalidAction {
            phase,
            action: name,
            reason,
        };
        let ensure = |ok: bool, reason| if ok { Ok(()) } else { Err(reject(reason)) };

        match action {
            QuizAction::Restart => *self = QuizSession::default(),
            QuizAction::Tick => self.tick(now),
            QuizAction::Setup(game) => {
                ensure(phase == QuizPhase::NotStarted, "a quiz is already in progress")?;
                *self = QuizSession::from_game(*game);
            }
            QuizAction::StartQuiz => {
                ensure(phase == QuizPhase::NotStarted, "the quiz has already started")?;
                ensure(
                    !self.game.teams.is_empty() && self.game.configured_round_count() > 0,
                    "no quiz has been set up",
                )?;
                self.game.phase = QuizPhase::Playing;
                self.move_to(0, 0);
            }
            QuizAction::RevealQuestion => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(!self.ui.question_revealed, "the question is already revealed")?;
                ensure(self.game.current_question().is_some(), "no question to reveal")?;
                self.ui.question_revealed = true;
                let seconds = self.game.round_timing().seconds;
                self.game.timer.reset(seconds);
            }
            QuizAction::SelectOption(index) => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(!self.ui.show_answer, "the answer is already shown")?;
                let option_count = self
                    .game
                    .current_question()
                    .and_then(Question::options)
                    .map(<[String]>::len)
                    .ok_or_else(|| reject("the question has no options"))?;
                ensure(index < option_count, "option index is out of range")?;
                self.ui.question_revealed = true;
                self.ui.selected_option = Some(index);
                self.ui.show_answer = true;
                self.pause_timer(now);
            }
            QuizAction::Pass => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(self.ui.question_revealed, "the question is not revealed")?;
                ensure(!self.ui.show_answer, "the answer is already shown")?;
                ensure(self.game.round_timing().pass_on, "pass-on is disabled for this round")?;
                self.pass(now);
            }
            QuizAction::MarkCorrect => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(self.ui.question_revealed, "the question is not revealed")?;
                self.award_active_team();
                self.advance();
            }
            QuizAction::RevealAnswer => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(self.ui.question_revealed, "the question is not revealed")?;
                ensure(!self.ui.show_answer, "the answer is already shown")?;
                self.ui.show_answer = true;
                self.ui.answered = true;
                self.pause_timer(now);
            }
            QuizAction::NextQuestion => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(self.ui.show_answer, "the answer has not been shown")?;
                self.advance();
            }
            QuizAction::PausePlayTimer(mode) => {
                ensure(phase.is_answering(), "no question is in play")?;
                ensure(self.ui.question_revealed, "the question is not revealed")?;
                ensure(!self.ui.show_answer, "the answer is already shown")?;
                let ticking = self.game.timer.is_ticking();
                match mode {
                    TimerMode::Toggle if ticking => self.pause_timer(now),
                    TimerMode::Toggle | TimerMode::Resume => self.resume_timer(now),
                    TimerMode::Pause => self.pause_timer(now),
                }
            }
            QuizAction::ContinueAfterRoundComplete => {
                ensure(phase == QuizPhase::RoundComplete, "no round summary is displayed")?;
                self.continue_after_round();
            }
            QuizAction::StartTieBreaker => {
                ensure(phase == QuizPhase::TieIntro, "no tie-breaker is pending")?;
                self.start_tie_breaker();
            }
            QuizAction::GoHome => {
                ensure(phase == QuizPhase::Finished, "the quiz is not finished")?;
                self.go_home();
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: u64) {
        if !self.game.phase.is_answering() || self.ui.show_answer {
            return;
        }
        let fallback = self.game.timer_fallback();
        self.game.timer.tick(fallback, now);
    }

    fn refresh_time_up(&mut self) {
        self.ui.time_up = self.game.phase.is_answering()
            && !self.ui.show_answer
            && self.game.timer.time_left == Some(0);
    }

    fn pause_timer(&mut self, now: u64) {
        let fallback = self.game.timer_fallback();
        self.game.timer.pause(fallback, now);
    }

    fn resume_timer(&mut self, now: u64) {
        let fallback = self.game.timer_fallback();
        self.game.timer.resume(fallback, now);
    }

    /// Make `question` of `round` the active question with fresh flags and a stopped timer.
    fn move_to(&mut self, round: usize, question: usize) {
        self.game.current_round_index = round;
        self.game.current_question = question;
        self.game.turn = 0;
        self.enter_question();
    }

    fn enter_question(&mut self) {
        self.ui.reset_question(self.game.turn);
        let seconds = self.game.round_timing().seconds;
        self.game.timer.reset(seconds);
    }

    fn pass(&mut self, now: u64) {
        let roster_size = self.game.teams_to_use().len();
        match turns::pass(
            self.game.turn,
            self.ui.original_turn,
            &mut self.ui.passed_teams,
            roster_size,
        ) {
            PassOutcome::NextTeam { turn } => {
                self.game.turn = turn;
                let seconds = self.game.round_timing().pass_seconds;
                self.game.timer.start_pass(seconds, now);
            }
            PassOutcome::Exhausted => {
                self.ui.show_answer = true;
                self.ui.answered = true;
                self.pause_timer(now);
            }
        }
    }

    fn award_active_team(&mut self) {
        let Some(team) = self.game.active_team().cloned() else {
            return;
        };
        let points = award_points(self.game.current_question(), self.ui.is_pass_on());
        let score = self.game.scores.entry(team).or_insert(0);
        *score = score.saturating_add(points);
    }

    fn advance(&mut self) {
        let roster_size = self.game.teams_to_use().len();
        self.game.current_question += 1;
        self.game.turn = turns::next_turn(self.ui.original_turn, roster_size);
        self.enter_question();
        if self.game.current_question >= self.game.question_count() {
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        let is_tie_breaker = self.game.current_round().is_some_and(Round::is_tie_breaker);
        if is_tie_breaker {
            let winners = gain_winners(
                self.game.scoring_roster(),
                &self.game.scores,
                &self.game.tie_base_scores,
            );
            self.finish(winners);
        } else {
            self.game.phase = QuizPhase::RoundComplete;
            self.ui.show_round_complete = true;
            self.ui.last_completed_round_index = Some(self.game.current_round_index);
        }
    }

    fn continue_after_round(&mut self) {
        self.ui.show_round_complete = false;
        let next = self.game.current_round_index + 1;
        let has_next = self
            .game
            .rounds
            .get(next)
            .is_some_and(|round| !round.is_tie_breaker());
        if has_next {
            self.game.phase = QuizPhase::Playing;
            self.move_to(next, 0);
            return;
        }

        let tied = tied_leaders(self.game.scoring_roster(), &self.game.scores);
        if tied.len() > 1 && !self.game.tie_breaker.questions.is_empty() {
            self.game.tied_teams = tied;
            self.game.phase = QuizPhase::TieIntro;
        } else {
            self.finish(tied);
        }
    }

    fn start_tie_breaker(&mut self) {
        let tied = if self.game.tied_teams.is_empty() {
            tied_leaders(self.game.scoring_roster(), &self.game.scores)
        } else {
            self.game.tied_teams.clone()
        };
        let questions = self.game.tie_breaker.derive_questions(tied.len());
        if tied.len() < 2 || questions.is_empty() {
            self.finish(tied);
            return;
        }

        let round = Round {
            id: TIE_BREAKER_ROUND_ID.to_string(),
            title: self.game.tie_breaker.title.clone(),
            kind: RoundKind::TieBreaker,
            questions,
            teams_to_use: tied.clone(),
        };
        let index = match self.game.tie_breaker_index() {
            Some(index) => {
                self.game.rounds[index] = round;
                index
            }
            None => {
                self.game.rounds.push(round);
                self.game.rounds.len() - 1
            }
        };
        let timing = self.game.tie_breaker.timing();
        self.game.timer_settings.set(index, timing);
        self.game.tie_base_scores = baseline(&tied, &self.game.scores);
        self.game.alive_teams = tied;
        self.game.phase = QuizPhase::TieBreaker;
        self.move_to(index, 0);
    }

    fn finish(&mut self, winners: Vec<TeamName>) {
        self.game.phase = QuizPhase::Finished;
        self.game.winner_teams = winners;
        self.ui.show_round_complete = false;
        self.ui.show_confetti = true;
    }

    fn go_home(&mut self) {
        self.game.rounds.retain(|round| !round.is_tie_breaker());
        let round_count = self.game.rounds.len();
        self.game.timer_settings.per_round.truncate(round_count);
        self.game.scores.values_mut().for_each(|score| *score = 0);
        self.game.alive_teams = self.game.teams.clone();
        self.game.winner_teams.clear();
        self.game.tied_teams.clear();
        self.game.tie_base_scores.clear();
        self.game.phase = QuizPhase::NotStarted;
        self.ui = UiFlags::default();
        self.move_to(0, 0);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::{
        game::{Answer, RoundTiming, TieBreakerBank},
        setup::{QuizSetup, RoundSetup},
    };

    pub(crate) const T0: u64 = 1_700_000_000_000;

    pub(crate) fn question(prompt: &str) -> Question {
        Question {
            prompt: prompt.into(),
            media_url: None,
            answer: Answer::Text {
                answer: format!("{prompt} answer"),
            },
            points: None,
        }
    }

    pub(crate) fn choice_question(prompt: &str) -> Question {
        Question {
            prompt: prompt.into(),
            media_url: None,
            answer: Answer::Choice {
                options: vec!["red".into(), "green".into(), "blue".into()],
                answer_index: 2,
            },
            points: Some(20),
        }
    }

    pub(crate) fn round(title: &str, questions: usize, pass_on: bool) -> RoundSetup {
        RoundSetup {
            id: title.to_lowercase(),
            title: title.into(),
            questions: (0..questions)
                .map(|n| question(&format!("{title} {n}")))
                .collect(),
            timing: RoundTiming {
                seconds: 30,
                pass_on,
                pass_seconds: 5,
            },
        }
    }

    pub(crate) fn bank(size: usize) -> TieBreakerBank {
        TieBreakerBank {
            questions: (0..size).map(|n| question(&format!("tie {n}"))).collect(),
            ..TieBreakerBank::default()
        }
    }

    pub(crate) fn configured(teams: &[&str], rounds: Vec<RoundSetup>, tie_bank: usize) -> QuizSession {
        let game = QuizSetup {
            teams: teams.iter().map(|team| team.to_string()).collect(),
            rounds,
            tie_breaker: bank(tie_bank),
        }
        .into_game()
        .unwrap();
        QuizSession::default()
            .apply(QuizAction::Setup(Box::new(game)), T0)
            .unwrap()
    }

    pub(crate) fn step(session: &mut QuizSession, action: QuizAction) {
        *session = session.apply(action, T0).unwrap();
    }

    fn started(teams: &[&str], rounds: Vec<RoundSetup>, tie_bank: usize) -> QuizSession {
        let mut session = configured(teams, rounds, tie_bank);
        step(&mut session, QuizAction::StartQuiz);
        session
    }

    fn correct(session: &mut QuizSession) {
        step(session, QuizAction::RevealQuestion);
        step(session, QuizAction::MarkCorrect);
    }

    fn skip(session: &mut QuizSession) {
        step(session, QuizAction::RevealQuestion);
        step(session, QuizAction::RevealAnswer);
        step(session, QuizAction::NextQuestion);
    }

    #[test]
    fn initial_session_is_not_started() {
        let session = QuizSession::default();
        assert_eq!(session.game.phase, QuizPhase::NotStarted);
        assert!(!session.timer_is_ticking());
    }

    #[test]
    fn correct_answers_score_and_rotate_turns() {
        let mut session = started(&["A", "B", "C"], vec![round("Main", 3, false)], 0);
        assert_eq!(session.game.phase, QuizPhase::Playing);
        assert_eq!(session.game.active_team().unwrap(), "A");

        correct(&mut session);
        assert_eq!(session.game.score_of("A"), 10);
        assert_eq!(session.game.current_question, 1);
        assert_eq!(session.game.active_team().unwrap(), "B");
        assert!(!session.ui.question_revealed);

        skip(&mut session);
        assert_eq!(session.game.score_of("B"), 0);
        assert_eq!(session.game.active_team().unwrap(), "C");
    }

    #[test]
    fn question_points_override_default() {
        let mut main = round("Main", 2, false);
        main.questions[0] = choice_question("colour");
        let mut session = started(&["A", "B"], vec![main], 0);
        correct(&mut session);
        assert_eq!(session.game.score_of("A"), 20);
    }

    #[test]
    fn oversized_point_overrides_saturate_the_score() {
        let mut opening = round("Jackpot", 4, false);
        for question in &mut opening.questions {
            question.points = Some(u32::MAX / 2 + 1);
        }
        let mut session = started(&["A", "B"], vec![opening], 0);
        for _ in 0..4 {
            step(&mut session, QuizAction::RevealQuestion);
            step(&mut session, QuizAction::MarkCorrect);
        }
        assert_eq!(session.game.score_of("A"), u32::MAX);
        assert_eq!(session.game.score_of("B"), u32::MAX);
    }

    #[test]
    fn two_teams_tied_after_last_round_play_four_tie_breaker_questions() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 6);
        correct(&mut session);
        correct(&mut session);
        assert_eq!(session.game.phase, QuizPhase::RoundComplete);
        assert!(session.ui.show_round_complete);
        assert_eq!(session.ui.last_completed_round_index, Some(0));

        step(&mut session, QuizAction::ContinueAfterRoundComplete);
        assert_eq!(session.game.phase, QuizPhase::TieIntro);
        assert_eq!(session.game.tied_teams, vec!["A", "B"]);

        step(&mut session, QuizAction::StartTieBreaker);
        assert_eq!(session.game.phase, QuizPhase::TieBreaker);
        let round = session.game.current_round().unwrap();
        assert!(round.is_tie_breaker());
        assert_eq!(round.questions.len(), 4);
        assert_eq!(session.game.alive_teams, vec!["A", "B"]);
        assert_eq!(session.game.turn, 0);
        assert_eq!(session.game.tie_base_scores.get("A"), Some(&10));
        assert_eq!(session.game.timer.time_left, Some(30));
    }

    #[test]
    fn tie_breaker_winner_is_largest_gain() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 4);
        correct(&mut session);
        correct(&mut session);
        step(&mut session, QuizAction::ContinueAfterRoundComplete);
        step(&mut session, QuizAction::StartTieBreaker);

        correct(&mut session);
        skip(&mut session);
        skip(&mut session);
        skip(&mut session);
        assert_eq!(session.game.phase, QuizPhase::Finished);
        assert_eq!(session.game.winner_teams, vec!["A"]);
        assert!(session.ui.show_confetti);
    }

    #[test]
    fn tie_without_bank_finishes_with_shared_win() {
        let mut session = started(&["A", "B", "C"], vec![round("Main", 3, false)], 0);
        correct(&mut session);
        correct(&mut session);
        correct(&mut session);
        step(&mut session, QuizAction::ContinueAfterRoundComplete);
        assert_eq!(session.game.phase, QuizPhase::Finished);
        assert_eq!(session.game.winner_teams, vec!["A", "B", "C"]);
    }

    #[test]
    fn continue_moves_to_next_round_with_first_team() {
        let mut session = started(
            &["A", "B"],
            vec![round("One", 2, false), round("Two", 2, false)],
            0,
        );
        correct(&mut session);
        skip(&mut session);
        step(&mut session, QuizAction::ContinueAfterRoundComplete);
        assert_eq!(session.game.phase, QuizPhase::Playing);
        assert_eq!(session.game.current_round_index, 1);
        assert_eq!(session.game.current_question, 0);
        assert_eq!(session.game.turn, 0);
        assert!(!session.ui.show_round_complete);
    }

    #[test]
    fn passed_question_scores_pass_on_points() {
        let mut session = started(&["A", "B", "C"], vec![round("Main", 3, true)], 0);
        step(&mut session, QuizAction::RevealQuestion);
        step(&mut session, QuizAction::Pass);
        assert_eq!(session.game.active_team().unwrap(), "B");
        assert!(session.game.timer.pass_mode);
        assert!(session.game.timer.running);
        assert_eq!(session.game.timer.time_left, Some(5));

        step(&mut session, QuizAction::MarkCorrect);
        assert_eq!(session.game.score_of("B"), 5);
        // the next question goes to the team after the one that started this one
        assert_eq!(session.game.active_team().unwrap(), "B");
        assert!(!session.game.timer.pass_mode);
    }

    #[test]
    fn passing_through_every_team_reveals_the_answer() {
        let mut session = started(&["A", "B", "C"], vec![round("Main", 3, true)], 0);
        step(&mut session, QuizAction::RevealQuestion);
        step(&mut session, QuizAction::Pass);
        step(&mut session, QuizAction::Pass);
        assert!(!session.ui.show_answer);
        step(&mut session, QuizAction::Pass);
        assert!(session.ui.show_answer);
        assert!(!session.game.timer.running);
        assert_eq!(session.ui.passed_teams, vec![0, 1, 2]);

        let err = session.apply(QuizAction::Pass, T0).unwrap_err();
        assert_eq!(err.action, "pass");
    }

    #[test]
    fn pass_is_rejected_when_round_disallows_it() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        step(&mut session, QuizAction::RevealQuestion);
        let err = session.apply(QuizAction::Pass, T0).unwrap_err();
        assert_eq!(err.phase, QuizPhase::Playing);
        assert_eq!(err.reason, "pass-on is disabled for this round");
    }

    #[test]
    fn selecting_an_option_shows_answer_without_scoring() {
        let mut main = round("Main", 2, false);
        main.questions[0] = choice_question("colour");
        let mut session = started(&["A", "B"], vec![main], 0);
        step(&mut session, QuizAction::SelectOption(1));
        assert!(session.ui.show_answer);
        assert!(session.ui.question_revealed);
        assert_eq!(session.ui.selected_option, Some(1));
        assert_eq!(session.game.score_of("A"), 0);
        assert_eq!(session.game.current_question, 0);

        let mut text_session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        assert!(text_session.apply(QuizAction::SelectOption(0), T0).is_err());
        step(&mut text_session, QuizAction::RevealQuestion);
    }

    #[test]
    fn timer_toggle_and_double_pause() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        step(&mut session, QuizAction::RevealQuestion);
        assert!(!session.timer_is_ticking());

        session = session
            .apply(QuizAction::PausePlayTimer(TimerMode::Toggle), T0)
            .unwrap();
        assert!(session.timer_is_ticking());

        session = session
            .apply(QuizAction::PausePlayTimer(TimerMode::Pause), T0 + 12_000)
            .unwrap();
        assert_eq!(session.game.timer.time_left, Some(18));
        let paused = session.clone();
        session = session
            .apply(QuizAction::PausePlayTimer(TimerMode::Pause), T0 + 20_000)
            .unwrap();
        assert_eq!(session, paused);
    }

    #[test]
    fn countdown_reaching_zero_flags_time_up() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        step(&mut session, QuizAction::RevealQuestion);
        step(&mut session, QuizAction::PausePlayTimer(TimerMode::Resume));
        for second in 1..=30 {
            session = session.apply(QuizAction::Tick, T0 + second * 1000).unwrap();
        }
        assert_eq!(session.game.timer.time_left, Some(0));
        assert!(!session.game.timer.running);
        assert!(session.ui.time_up);

        step(&mut session, QuizAction::RevealAnswer);
        assert!(!session.ui.time_up);
    }

    #[test]
    fn answer_reveal_requires_revealed_question() {
        let session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        let err = session.apply(QuizAction::RevealAnswer, T0).unwrap_err();
        assert_eq!(err.reason, "the question is not revealed");
        assert!(session.apply(QuizAction::NextQuestion, T0).is_err());
    }

    #[test]
    fn actions_outside_their_phase_are_rejected() {
        let session = configured(&["A", "B"], vec![round("Main", 2, false)], 0);
        let err = session.apply(QuizAction::GoHome, T0).unwrap_err();
        assert_eq!(err.phase, QuizPhase::NotStarted);
        assert_eq!(err.action, "go_home");
        assert!(session.apply(QuizAction::StartTieBreaker, T0).is_err());

        let playing = session.apply(QuizAction::StartQuiz, T0).unwrap();
        assert!(playing.apply(QuizAction::StartQuiz, T0).is_err());
        let setup = QuizAction::Setup(Box::new(session.game.clone()));
        assert!(playing.apply(setup, T0).is_err());
    }

    #[test]
    fn go_home_keeps_roster_and_clears_progress() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 4);
        correct(&mut session);
        correct(&mut session);
        step(&mut session, QuizAction::ContinueAfterRoundComplete);
        step(&mut session, QuizAction::StartTieBreaker);
        correct(&mut session);
        skip(&mut session);
        skip(&mut session);
        skip(&mut session);
        assert_eq!(session.game.rounds.len(), 2);

        step(&mut session, QuizAction::GoHome);
        assert_eq!(session.game.phase, QuizPhase::NotStarted);
        assert_eq!(session.game.teams, vec!["A", "B"]);
        assert_eq!(session.game.alive_teams, vec!["A", "B"]);
        assert_eq!(session.game.rounds.len(), 1);
        assert_eq!(session.game.timer_settings.per_round.len(), 1);
        assert!(session.game.scores.values().all(|score| *score == 0));
        assert!(session.game.winner_teams.is_empty());
        assert_eq!(session.ui, {
            let mut flags = UiFlags::default();
            flags.reset_question(0);
            flags
        });

        step(&mut session, QuizAction::StartQuiz);
        assert_eq!(session.game.phase, QuizPhase::Playing);
    }

    #[test]
    fn restart_discards_everything() {
        let mut session = started(&["A", "B"], vec![round("Main", 2, false)], 0);
        correct(&mut session);
        step(&mut session, QuizAction::Restart);
        assert_eq!(session, QuizSession::default());
    }

    #[test]
    fn ticks_outside_play_change_nothing() {
        let session = configured(&["A", "B"], vec![round("Main", 2, false)], 0);
        let next = session.apply(QuizAction::Tick, T0 + 5_000).unwrap();
        assert_eq!(next, session);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scores_only_grow_and_turn_stays_in_roster(
                teams in 2usize..6,
                moves in proptest::collection::vec(0u8..4, 1..40),
            ) {
                let names: Vec<String> = (0..teams).map(|i| format!("T{i}")).collect();
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                let mut session = started(&refs, vec![round("Main", teams * 3, true)], 0);
                let mut total = 0;
                for choice in moves {
                    let action = match choice {
                        0 => QuizAction::RevealQuestion,
                        1 => QuizAction::Pass,
                        2 => QuizAction::MarkCorrect,
                        _ => QuizAction::RevealAnswer,
                    };
                    if let Ok(next) = session.apply(action, T0) {
                        session = next;
                    }
                    let sum: u32 = session.game.scores.values().sum();
                    prop_assert!(sum >= total);
                    total = sum;
                    if session.game.phase == QuizPhase::Playing {
                        prop_assert!(session.game.turn < teams);
                    }
                }
            }
        }
    }
}
