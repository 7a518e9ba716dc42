use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::AppResult,
    models::{
        domain::{Attempt, MasteredQuestionSet, ResponseRecord, UserProfile},
        dto::{QuestionFeedback, QuizRequest, QuizResponse, QuizSubmission, SubmissionOutcome},
    },
    repositories::{HistoryRepository, ProfileRepository},
    services::{
        difficulty_policy::{difficulty_reasoning, next_difficulty},
        generation::{GenerationPipeline, GenerationRequest},
    },
};

/// Coordinates one quiz request or submission. Holds no state of its own
/// beyond handles to its collaborators.
pub struct AdaptiveQuizService {
    history: Arc<dyn HistoryRepository>,
    profiles: Arc<dyn ProfileRepository>,
    pipeline: Arc<GenerationPipeline>,
    quiz_size: usize,
    mastered_cap: usize,
}

impl AdaptiveQuizService {
    pub fn new(
        history: Arc<dyn HistoryRepository>,
        profiles: Arc<dyn ProfileRepository>,
        pipeline: Arc<GenerationPipeline>,
        quiz_size: usize,
        mastered_cap: usize,
    ) -> Self {
        Self {
            history,
            profiles,
            pipeline,
            quiz_size,
            mastered_cap,
        }
    }

    /// Validates a transport-level request before building the quiz.
    pub async fn request_quiz(&self, request: &QuizRequest) -> AppResult<QuizResponse> {
        request.validate()?;
        Ok(self.on_quiz_request(&request.user_id, request.topic.trim()).await)
    }

    /// Builds the next quiz for `user_id`. Store outages degrade
    /// personalization but never fail the request.
    pub async fn on_quiz_request(&self, user_id: &str, topic: &str) -> QuizResponse {
        let profile = self.load_profile(user_id).await;

        let history = match self.history.get_attempts(user_id).await {
            Ok(history) => history,
            Err(err) => {
                log::warn!(
                    "History unavailable for user '{}', treating as new user: {}",
                    user_id,
                    err
                );
                Vec::new()
            }
        };

        let is_first_ever_attempt = history.is_empty();
        let difficulty = next_difficulty(&history, is_first_ever_attempt);
        let reasoning = difficulty_reasoning(difficulty, &history);

        let mastered = if is_first_ever_attempt {
            MasteredQuestionSet::new()
        } else {
            match self
                .history
                .get_mastered_question_texts(user_id, self.mastered_cap)
                .await
            {
                Ok(mastered) => mastered,
                Err(err) => {
                    log::warn!(
                        "Mastered questions unavailable for user '{}', not filtering: {}",
                        user_id,
                        err
                    );
                    MasteredQuestionSet::new()
                }
            }
        };

        log::info!(
            "Building {} quiz on '{}' for user '{}' ({} mastered questions excluded)",
            difficulty,
            topic,
            user_id,
            mastered.len()
        );

        let request = GenerationRequest::new(topic, difficulty, self.quiz_size, profile, mastered);
        let questions = self.pipeline.generate(&request).await;

        QuizResponse {
            topic: topic.to_string(),
            difficulty,
            reasoning,
            questions,
        }
    }

    /// Grades a submission and records it. The score is returned even when
    /// the history store rejects the write.
    pub async fn on_quiz_submission(
        &self,
        submission: QuizSubmission,
    ) -> AppResult<SubmissionOutcome> {
        submission.validate()?;

        let responses: Vec<ResponseRecord> = submission
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                ResponseRecord::grade(
                    question,
                    &submission.topic,
                    submission.difficulty,
                    submission.answer_for(i),
                )
            })
            .collect();

        let question_feedback = responses
            .iter()
            .zip(&submission.questions)
            .map(|(record, question)| QuestionFeedback::from_record(record, &question.explanation))
            .collect();

        let attempt = Attempt::from_responses(
            &submission.user_id,
            &submission.topic,
            submission.difficulty,
            responses,
        );

        let persisted = match self.history.append_attempt(attempt.clone()).await {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "Failed to record attempt {} for user '{}': {}",
                    attempt.id,
                    attempt.user_id,
                    err
                );
                false
            }
        };

        let next = if persisted {
            match self.history.get_attempts(&attempt.user_id).await {
                Ok(history) if !history.is_empty() => next_difficulty(&history, false),
                Ok(_) => next_difficulty(std::slice::from_ref(&attempt), false),
                Err(err) => {
                    log::warn!(
                        "Could not reload history for user '{}', using the submitted attempt: {}",
                        attempt.user_id,
                        err
                    );
                    next_difficulty(std::slice::from_ref(&attempt), false)
                }
            }
        } else {
            next_difficulty(std::slice::from_ref(&attempt), false)
        };

        log::info!(
            "User '{}' scored {}/{} on '{}', next difficulty {}",
            attempt.user_id,
            attempt.score,
            attempt.max_score,
            attempt.topic,
            next
        );

        Ok(SubmissionOutcome {
            attempt_id: attempt.id.clone(),
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage().unwrap_or(0.0),
            next_difficulty: next,
            persisted,
            question_feedback,
        })
    }

    async fn load_profile(&self, user_id: &str) -> UserProfile {
        match self.profiles.find_by_user_id(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                log::debug!("No profile for user '{}', using defaults", user_id);
                UserProfile::default_for(user_id)
            }
            Err(err) => {
                log::warn!(
                    "Profile lookup failed for user '{}', using defaults: {}",
                    user_id,
                    err
                );
                UserProfile::default_for(user_id)
            }
        }
    }
}
