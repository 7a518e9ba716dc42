use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::difficulty::DifficultyLevel;

pub const OPTION_COUNT: usize = 4;

/// Anything that carries the literal question text used for de-duplication.
pub trait HasQuestionText {
    fn question_text(&self) -> &str;
}

/// A freshly produced question that has not yet passed the validation gate
/// or the mastery filter.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct CandidateQuestion {
    #[validate(custom(function = "not_blank"))]
    pub question: String,
    #[validate(
        length(equal = 4, message = "exactly four options are required"),
        custom(function = "distinct_options")
    )]
    pub options: Vec<String>,
    #[validate(range(max = 3))]
    pub correct_answer: usize,
    #[validate(custom(function = "not_blank"))]
    pub explanation: String,
}

impl CandidateQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }
}

impl HasQuestionText for CandidateQuestion {
    fn question_text(&self) -> &str {
        &self.question
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn distinct_options(options: &[String]) -> Result<(), ValidationError> {
    let unique: HashSet<&str> = options.iter().map(String::as_str).collect();
    if unique.len() != options.len() {
        return Err(ValidationError::new("duplicate_option"));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Curriculum,
    Generative,
    Template,
}

/// A question accepted by the generation pipeline and served to a user.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub difficulty: DifficultyLevel,
    pub source: QuestionSource,
}

impl Question {
    pub fn accept(
        candidate: CandidateQuestion,
        difficulty: DifficultyLevel,
        source: QuestionSource,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            question: candidate.question,
            options: candidate.options,
            correct_answer: candidate.correct_answer,
            explanation: candidate.explanation,
            difficulty,
            source,
        }
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

impl HasQuestionText for Question {
    fn question_text(&self) -> &str {
        &self.question
    }
}
