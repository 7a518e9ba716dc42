use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{difficulty::DifficultyLevel, question::Question};

/// One completed quiz. Immutable once built; the history store only appends.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub responses: Vec<ResponseRecord>,
    pub score: u32,
    pub max_score: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseRecord {
    pub question: String,
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub options: Vec<String>,
    pub chosen_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl ResponseRecord {
    /// Grades a single answer. An index outside the option set counts as
    /// unanswered.
    pub fn grade(
        question: &Question,
        topic: &str,
        difficulty: DifficultyLevel,
        selected: Option<usize>,
    ) -> Self {
        let chosen_answer = selected
            .and_then(|idx| question.options.get(idx))
            .cloned();
        let correct_answer = question.correct_option().unwrap_or_default().to_string();
        let is_correct = chosen_answer.is_some() && selected == Some(question.correct_answer);

        ResponseRecord {
            question: question.question.clone(),
            topic: topic.to_string(),
            difficulty,
            options: question.options.clone(),
            chosen_answer,
            correct_answer,
            is_correct,
        }
    }
}

impl Attempt {
    /// Builds an attempt whose score fields are derived from the records, so
    /// `responses.len() == max_score` always holds.
    pub fn from_responses(
        user_id: &str,
        topic: &str,
        difficulty: DifficultyLevel,
        responses: Vec<ResponseRecord>,
    ) -> Self {
        let score = responses.iter().filter(|r| r.is_correct).count() as u32;
        let max_score = responses.len() as u32;

        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            difficulty,
            responses,
            score,
            max_score,
            created_at: Utc::now(),
        }
    }

    /// Percentage score, or `None` when there is nothing to divide by.
    pub fn percentage(&self) -> Option<f64> {
        if self.max_score == 0 {
            return None;
        }
        Some(self.score as f64 * 100.0 / self.max_score as f64)
    }
}

/// Distinct question texts a user has answered correctly at least once,
/// most recent first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasteredQuestionSet {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl MasteredQuestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first occurrence of each text and stops at `cap` entries.
    pub fn from_texts_capped<I, S>(texts: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for text in texts {
            if set.len() >= cap {
                break;
            }
            set.insert(text.into());
        }
        set
    }

    /// Derives the set from attempts ordered newest first.
    pub fn from_attempts(attempts: &[Attempt], cap: usize) -> Self {
        let texts = attempts
            .iter()
            .flat_map(|attempt| attempt.responses.iter())
            .filter(|response| response.is_correct && !response.question.is_empty())
            .map(|response| response.question.clone());
        Self::from_texts_capped(texts, cap)
    }

    pub fn insert(&mut self, text: String) -> bool {
        if self.lookup.contains(&text) {
            return false;
        }
        self.lookup.insert(text.clone());
        self.ordered.push(text);
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lookup.contains(text)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for MasteredQuestionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_texts_capped(iter, usize::MAX)
    }
}
