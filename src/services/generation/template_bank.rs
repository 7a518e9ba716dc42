use std::collections::HashMap;

use serde::Deserialize;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{CandidateQuestion, DifficultyLevel},
};

const BUILTIN_BANK: &str = include_str!("../../constants/template_bank.json");

#[derive(Debug, Default, Clone, Deserialize)]
struct LevelBank {
    #[serde(default)]
    easy: Vec<CandidateQuestion>,
    #[serde(default)]
    medium: Vec<CandidateQuestion>,
    #[serde(default)]
    hard: Vec<CandidateQuestion>,
}

impl LevelBank {
    fn level(&self, difficulty: DifficultyLevel) -> &[CandidateQuestion] {
        match difficulty {
            DifficultyLevel::Easy => &self.easy,
            DifficultyLevel::Medium => &self.medium,
            DifficultyLevel::Hard => &self.hard,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BankFile {
    default: LevelBank,
    #[serde(default)]
    topics: HashMap<String, LevelBank>,
}

/// Pre-authored questions, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct TemplateBank {
    default: LevelBank,
    topics: HashMap<String, LevelBank>,
}

impl TemplateBank {
    /// The bank compiled into the binary.
    pub fn builtin() -> AppResult<Self> {
        Self::from_json(BUILTIN_BANK)
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let file: BankFile = serde_json::from_str(json).map_err(|e| {
            AppError::ConfigurationError(format!("Template bank is not valid JSON: {}", e))
        })?;

        let topics = file
            .topics
            .into_iter()
            .map(|(topic, bank)| (normalize_topic(&topic), bank))
            .collect();

        Ok(TemplateBank {
            default: file.default,
            topics,
        })
    }

    /// Fails when any difficulty has no default templates or when a template
    /// would not pass the validation gate.
    pub fn validate(&self) -> AppResult<()> {
        for difficulty in DifficultyLevel::ALL {
            if self.default.level(difficulty).is_empty() {
                return Err(AppError::ConfigurationError(format!(
                    "Default template bank has no {} questions",
                    difficulty
                )));
            }
        }

        let banks = std::iter::once(("default", &self.default))
            .chain(self.topics.iter().map(|(topic, bank)| (topic.as_str(), bank)));
        for (topic, bank) in banks {
            for difficulty in DifficultyLevel::ALL {
                for template in bank.level(difficulty) {
                    template.validate().map_err(|e| {
                        AppError::ConfigurationError(format!(
                            "Malformed {} template in '{}' bank ({:?}): {}",
                            difficulty, topic, template.question, e
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Templates for the topic at this difficulty, or the default set when the
    /// topic has no dedicated questions.
    pub fn for_topic(&self, topic: &str, difficulty: DifficultyLevel) -> &[CandidateQuestion] {
        self.topics
            .get(&normalize_topic(topic))
            .map(|bank| bank.level(difficulty))
            .filter(|templates| !templates.is_empty())
            .unwrap_or_else(|| self.default.level(difficulty))
    }
}

fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase()
}
