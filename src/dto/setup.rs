use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    config::AppConfig,
    dto::validation::{validate_choice, validate_not_blank, validate_points},
    state::{
        game::{Answer, Question, RoundTiming, TIE_BREAKER_DEFAULT_TITLE, TieBreakerBank},
        setup::{QuizSetup, RoundSetup},
    },
};

/// Payload configuring a new quiz.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuizSetupRequest {
    /// Team names in seating order.
    #[validate(length(min = 2, max = 10, message = "a quiz needs between 2 and 10 teams"))]
    pub teams: Vec<String>,
    /// Rounds in play order.
    #[validate(nested)]
    pub rounds: Vec<RoundInput>,
    /// Tie-breaker bank; the configured default bank is used when omitted or empty.
    #[serde(default)]
    #[validate(nested)]
    pub tie_breaker: Option<TieBreakerInput>,
}

/// One selected round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RoundInput {
    /// Identifier; generated from the position when omitted.
    #[serde(default)]
    pub id: Option<String>,
    /// Title shown on the round intro and the scoreboard.
    pub title: String,
    /// Base countdown in seconds; the configured default when omitted.
    #[serde(default)]
    #[validate(range(min = 5, max = 600))]
    pub seconds: Option<u32>,
    /// Whether questions may be passed on.
    #[serde(default)]
    pub pass_on: bool,
    /// Pass-on countdown in seconds; the configured default when omitted.
    #[serde(default)]
    #[validate(range(min = 5, max = 600))]
    pub pass_seconds: Option<u32>,
    /// Questions in play order; trimmed so every team opens the same number.
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Question definition. Multiple-choice when `options` is present, free text otherwise.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Question text; may itself be a media URL.
    #[serde(alias = "question")]
    pub prompt: String,
    /// Image, audio or video shown with the prompt.
    #[serde(default, alias = "media")]
    pub media_url: Option<String>,
    /// Options of a multiple-choice question.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Index of the correct option; required with `options`.
    #[serde(default, alias = "answerIndex")]
    pub answer_index: Option<usize>,
    /// Free-text answer; required without `options`.
    #[serde(default)]
    pub answer: Option<String>,
    /// Point override between 1 and 1000; 10 when omitted.
    #[serde(default)]
    pub points: Option<u32>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.prompt) {
            errors.add("prompt", e);
        }

        if let Some(points) = self.points {
            if let Err(e) = validate_points(points) {
                errors.add("points", e);
            }
        }

        match (&self.options, self.answer_index) {
            (Some(options), Some(index)) => {
                if let Err(e) = validate_choice(options, index) {
                    errors.add("answer_index", e);
                }
            }
            (Some(_), None) => {
                let mut e = validator::ValidationError::new("answer_index_missing");
                e.message = Some("Multiple-choice questions need an answer index".into());
                errors.add("answer_index", e);
            }
            (None, _) => {
                if let Err(e) = validate_not_blank(self.answer.as_deref().unwrap_or_default()) {
                    errors.add("answer", e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Tie-breaker question bank.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TieBreakerInput {
    /// Round title; "Tie-Breaker Round" when omitted.
    #[serde(default)]
    pub title: Option<String>,
    /// Base countdown in seconds; 30 when omitted.
    #[serde(default)]
    #[validate(range(min = 5, max = 600))]
    pub time_limit_seconds: Option<u32>,
    /// Whether tie-breaker questions may be passed on.
    #[serde(default)]
    pub pass_on: bool,
    /// Pass-on countdown in seconds; the configured default when omitted.
    #[serde(default)]
    #[validate(range(min = 5, max = 600))]
    pub pass_seconds: Option<u32>,
    /// Questions drawn in order when a tie-breaker starts.
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

impl From<QuestionInput> for Question {
    fn from(value: QuestionInput) -> Self {
        let answer = match (value.options, value.answer_index) {
            (Some(options), Some(answer_index)) => Answer::Choice {
                options,
                answer_index,
            },
            _ => Answer::Text {
                answer: value.answer.unwrap_or_default(),
            },
        };
        Question {
            prompt: value.prompt,
            media_url: value.media_url.filter(|url| !url.trim().is_empty()),
            answer,
            points: value.points,
        }
    }
}

impl QuizSetupRequest {
    /// Domain setup, filling omitted timings from `config`.
    pub fn into_setup(self, config: &AppConfig) -> QuizSetup {
        let rounds = self
            .rounds
            .into_iter()
            .map(|round| RoundSetup {
                id: round.id.unwrap_or_default(),
                title: round.title,
                timing: RoundTiming {
                    seconds: round.seconds.unwrap_or(config.default_round_seconds),
                    pass_on: round.pass_on,
                    pass_seconds: round.pass_seconds.unwrap_or(config.default_pass_seconds),
                },
                questions: round.questions.into_iter().map(Into::into).collect(),
            })
            .collect();

        let tie_breaker = match self.tie_breaker {
            Some(bank) => TieBreakerBank {
                title: bank
                    .title
                    .filter(|title| !title.trim().is_empty())
                    .unwrap_or_else(|| TIE_BREAKER_DEFAULT_TITLE.to_string()),
                time_limit_seconds: bank.time_limit_seconds,
                pass_on: bank.pass_on,
                pass_seconds: bank.pass_seconds.unwrap_or(config.default_pass_seconds),
                questions: bank.questions.into_iter().map(Into::into).collect(),
            },
            None => TieBreakerBank::default(),
        };

        QuizSetup {
            teams: self.teams,
            rounds,
            tie_breaker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> QuizSetupRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_legacy_question_keys() {
        let payload = request(json!({
            "teams": ["Owls", "Foxes"],
            "rounds": [{
                "title": "Flags",
                "questions": [
                    { "question": "Which flag is this?", "media": "https://img/fr.png",
                      "options": ["France", "Italy"], "answerIndex": 0 },
                    { "prompt": "Capital of Peru?", "answer": "Lima", "points": 20 }
                ]
            }]
        }));
        assert!(payload.validate().is_ok());

        let setup = payload.into_setup(&AppConfig::default());
        let round = &setup.rounds[0];
        assert_eq!(round.timing.seconds, 30);
        assert_eq!(round.timing.pass_seconds, 5);
        assert!(!round.timing.pass_on);
        assert_eq!(round.questions[0].correct_answer_text(), "France");
        assert_eq!(round.questions[1].points(), 20);
        assert!(setup.tie_breaker.questions.is_empty());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let payload = request(json!({
            "teams": ["Solo"],
            "rounds": [{
                "title": "Quick",
                "seconds": 2,
                "questions": [{ "prompt": "2+2?", "options": ["3", "4"], "answer_index": 5 }]
            }]
        }));
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("teams"));
        assert!(errors.errors().contains_key("rounds"));
    }

    #[test]
    fn oversized_point_overrides_are_rejected() {
        let question: QuestionInput = serde_json::from_value(json!({
            "prompt": "Jackpot?", "answer": "yes", "points": 2_147_483_648u32
        }))
        .unwrap();
        let errors = question.validate().unwrap_err();
        assert!(errors.errors().contains_key("points"));

        let question: QuestionInput =
            serde_json::from_value(json!({ "prompt": "Bonus?", "answer": "yes", "points": 50 }))
                .unwrap();
        assert!(question.validate().is_ok());
    }

    #[test]
    fn text_questions_need_an_answer() {
        let question: QuestionInput =
            serde_json::from_value(json!({ "prompt": "Name a colour" })).unwrap();
        assert!(question.validate().is_err());
    }

    #[test]
    fn tie_breaker_bank_keeps_its_timing() {
        let payload = request(json!({
            "teams": ["A", "B"],
            "rounds": [],
            "tie_breaker": {
                "time_limit_seconds": 15,
                "questions": [{ "prompt": "Closest guess: height of Everest?", "answer": "8849" }]
            }
        }));
        assert!(payload.validate().is_ok());
        let setup = payload.into_setup(&AppConfig::default());
        assert_eq!(setup.tie_breaker.title, "Tie-Breaker Round");
        assert_eq!(setup.tie_breaker.timing().seconds, 15);
        assert_eq!(setup.tie_breaker.questions.len(), 1);
    }
}
