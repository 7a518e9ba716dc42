use crate::models::domain::{
    Attempt, CandidateQuestion, DifficultyLevel, MasteredQuestionSet, Question, QuestionSource,
    ResponseRecord, UserProfile,
};
use crate::services::generation::GenerationRequest;

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A well-formed candidate whose correct option is "Option B".
    pub fn candidate(text: &str) -> CandidateQuestion {
        CandidateQuestion::new(
            text,
            vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            1,
            format!("Explanation for {}", text),
        )
    }

    pub fn question(text: &str) -> Question {
        Question::accept(candidate(text), DifficultyLevel::Medium, QuestionSource::Template)
    }

    pub fn test_profile() -> UserProfile {
        UserProfile::new("test-user", "Test", 12, &["football"])
    }

    /// Builds an attempt with one response per `(question, is_correct)` pair.
    pub fn attempt_with_results(user_id: &str, results: &[(&str, bool)]) -> Attempt {
        let responses = results
            .iter()
            .map(|(text, is_correct)| {
                let q = question(text);
                let selected = if *is_correct { 1 } else { 0 };
                ResponseRecord::grade(&q, "saving money", DifficultyLevel::Medium, Some(selected))
            })
            .collect();
        Attempt::from_responses(user_id, "saving money", DifficultyLevel::Medium, responses)
    }

    /// Builds an attempt scoring `correct` out of `total`.
    pub fn attempt_with_score(user_id: &str, correct: usize, total: usize) -> Attempt {
        let texts: Vec<String> = (0..total).map(|i| format!("question {}", i)).collect();
        let results: Vec<(&str, bool)> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| (text.as_str(), i < correct))
            .collect();
        attempt_with_results(user_id, &results)
    }

    pub fn generation_request(
        topic: &str,
        difficulty: DifficultyLevel,
        count: usize,
    ) -> GenerationRequest {
        GenerationRequest::new(
            topic,
            difficulty,
            count,
            test_profile(),
            MasteredQuestionSet::new(),
        )
    }
}
