use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{DifficultyLevel, Question};

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuizRequest {
    #[validate(length(min = 1, message = "user_id cannot be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "topic cannot be empty"))]
    pub topic: String,
}

impl QuizRequest {
    pub fn new(user_id: &str, topic: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            topic: topic.to_string(),
        }
    }
}

/// Answers for a served quiz. `answers[i]` is the option index chosen for
/// `questions[i]`; `None` or a missing entry means unanswered.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuizSubmission {
    #[validate(length(min = 1, message = "user_id cannot be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "topic cannot be empty"))]
    pub topic: String,
    pub difficulty: DifficultyLevel,
    #[validate(length(min = 1, message = "a submission needs at least one question"))]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<Option<usize>>,
}

impl QuizSubmission {
    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{CandidateQuestion, QuestionSource};

    fn question() -> Question {
        Question::accept(
            CandidateQuestion::new(
                "What is saving?",
                vec!["Keeping".into(), "Giving".into(), "Losing".into(), "Making".into()],
                0,
                "Saving is keeping money for later.",
            ),
            DifficultyLevel::Easy,
            QuestionSource::Template,
        )
    }

    #[test]
    fn quiz_request_rejects_empty_topic() {
        let request = QuizRequest::new("user-1", "");
        assert!(request.validate().is_err());
        assert!(QuizRequest::new("user-1", "budgeting").validate().is_ok());
    }

    #[test]
    fn submission_requires_questions() {
        let submission = QuizSubmission {
            user_id: "user-1".into(),
            topic: "saving".into(),
            difficulty: DifficultyLevel::Easy,
            questions: vec![],
            answers: vec![],
        };
        assert!(submission.validate().is_err());
    }

    #[test]
    fn answer_for_handles_missing_entries() {
        let submission = QuizSubmission {
            user_id: "user-1".into(),
            topic: "saving".into(),
            difficulty: DifficultyLevel::Easy,
            questions: vec![question(), question()],
            answers: vec![Some(2)],
        };

        assert_eq!(submission.answer_for(0), Some(2));
        assert_eq!(submission.answer_for(1), None);
    }

    #[test]
    fn submission_answers_default_to_empty() {
        let json = serde_json::json!({
            "user_id": "user-1",
            "topic": "saving",
            "difficulty": "easy",
            "questions": [question()],
        });
        let submission: QuizSubmission = serde_json::from_value(json).expect("parse");
        assert!(submission.answers.is_empty());
    }
}
