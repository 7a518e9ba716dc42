//! Removes questions a user has already answered correctly.
//!
//! Matching is literal: case-sensitive, exact text. A reworded question is a
//! different question as far as this filter is concerned.

use crate::models::domain::{HasQuestionText, MasteredQuestionSet};

/// Drops every item whose text is in `mastered`. When that would leave
/// nothing, the original pool is returned unchanged so a quiz can still be
/// served, with repeats.
pub fn filter_mastered<T>(pool: Vec<T>, mastered: &MasteredQuestionSet) -> Vec<T>
where
    T: HasQuestionText,
{
    if mastered.is_empty() || pool.is_empty() {
        return pool;
    }

    let all_mastered = pool
        .iter()
        .all(|item| mastered.contains(item.question_text()));
    if all_mastered {
        log::debug!(
            "All {} candidates already mastered, keeping unfiltered pool",
            pool.len()
        );
        return pool;
    }

    pool.into_iter()
        .filter(|item| !mastered.contains(item.question_text()))
        .collect()
}
