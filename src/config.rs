use std::{env, path::PathBuf, time::Duration};

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub attempts_collection: String,
    pub profiles_collection: String,
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub generation_timeout_secs: u64,
    pub quiz_size: usize,
    pub mastered_question_cap: usize,
    pub curriculum_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        // A missing .env file is normal outside local development.
        let _ = dotenvy::dotenv();

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "adaptive-quiz-local".to_string()),
            attempts_collection: env::var("ATTEMPTS_COLLECTION")
                .unwrap_or_else(|_| "quiz_attempts".to_string()),
            profiles_collection: env::var("PROFILES_COLLECTION")
                .unwrap_or_else(|_| "user_profiles".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            generation_timeout_secs: env::var("GENERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            quiz_size: env::var("QUIZ_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            mastered_question_cap: env::var("MASTERED_QUESTION_CAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            curriculum_dir: env::var("CURRICULUM_DIR").ok().map(PathBuf::from),
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Rejects settings the engine cannot run with. Called once at startup.
    pub fn validate(&self) -> AppResult<()> {
        if self.quiz_size == 0 {
            return Err(AppError::ConfigurationError(
                "QUIZ_SIZE must be at least 1".to_string(),
            ));
        }
        if self.mastered_question_cap == 0 {
            return Err(AppError::ConfigurationError(
                "MASTERED_QUESTION_CAP must be at least 1".to_string(),
            ));
        }
        if self.generation_timeout_secs == 0 {
            return Err(AppError::ConfigurationError(
                "GENERATION_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "adaptive-quiz-test".to_string(),
            attempts_collection: "quiz_attempts".to_string(),
            profiles_collection: "user_profiles".to_string(),
            openai_api_key: None,
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_model: "test-model".to_string(),
            generation_timeout_secs: 2,
            quiz_size: 5,
            mastered_question_cap: 30,
            curriculum_dir: None,
        }
    }
}
