//! Maps recent performance to the difficulty of the next quiz.
//!
//! Only the most recent attempt counts. Older history does not smooth the
//! decision, so a single strong or weak quiz moves the learner immediately.

use crate::models::domain::{Attempt, DifficultyLevel};

pub const HARD_THRESHOLD: f64 = 80.0;
pub const MEDIUM_THRESHOLD: f64 = 50.0;

/// `recent_attempts` must be ordered newest first.
pub fn next_difficulty(recent_attempts: &[Attempt], is_first_ever_attempt: bool) -> DifficultyLevel {
    if is_first_ever_attempt {
        return DifficultyLevel::Medium;
    }

    match recent_attempts.first().and_then(Attempt::percentage) {
        Some(percentage) => difficulty_for_percentage(percentage),
        None => DifficultyLevel::Medium,
    }
}

pub fn difficulty_for_percentage(percentage: f64) -> DifficultyLevel {
    if percentage >= HARD_THRESHOLD {
        DifficultyLevel::Hard
    } else if percentage >= MEDIUM_THRESHOLD {
        DifficultyLevel::Medium
    } else {
        DifficultyLevel::Easy
    }
}

/// Short explanation shown next to the chosen difficulty.
pub fn difficulty_reasoning(level: DifficultyLevel, recent_attempts: &[Attempt]) -> String {
    let Some(percentage) = recent_attempts.first().and_then(Attempt::percentage) else {
        return "Starting at medium difficulty until we learn how you do.".to_string();
    };

    match level {
        DifficultyLevel::Easy => format!(
            "Your last score was {:.0}%. Easier questions will help build a strong foundation.",
            percentage
        ),
        DifficultyLevel::Medium => format!(
            "Your last score was {:.0}%. Medium questions keep the challenge balanced.",
            percentage
        ),
        DifficultyLevel::Hard => format!(
            "Your last score was {:.0}%. Hard questions will push your learning forward.",
            percentage
        ),
    }
}
