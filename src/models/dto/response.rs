use serde::Serialize;

use crate::models::domain::{DifficultyLevel, Question, ResponseRecord};

#[derive(Debug, Clone, Serialize)]
pub struct QuizResponse {
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub reasoning: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionFeedback {
    pub question: String,
    pub chosen_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl QuestionFeedback {
    pub fn from_record(record: &ResponseRecord, explanation: &str) -> Self {
        QuestionFeedback {
            question: record.question.clone(),
            chosen_answer: record.chosen_answer.clone(),
            correct_answer: record.correct_answer.clone(),
            is_correct: record.is_correct,
            explanation: explanation.to_string(),
        }
    }
}

/// Result of grading a submission. `persisted` is false when the attempt
/// could not be written to the history store; the score is valid either way.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub attempt_id: String,
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub next_difficulty: DifficultyLevel,
    pub persisted: bool,
    pub question_feedback: Vec<QuestionFeedback>,
}
