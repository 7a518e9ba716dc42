use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    constants::quiz_prompt::{build_quiz_prompt, QUIZ_SYSTEM_PROMPT},
    errors::GenerationError,
    models::domain::CandidateQuestion,
    services::generation::GeneratorPrompt,
};

/// The generative capability: may produce candidate questions or fail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn try_generate(
        &self,
        prompt: &GeneratorPrompt,
    ) -> Result<Vec<CandidateQuestion>, GenerationError>;
}

/// Shape the model is asked to return.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedBatch {
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// 0-based index into `options`.
    #[serde(default)]
    pub correct_answer: Option<i64>,
    #[serde(default)]
    pub explanation: String,
}

impl From<GeneratedQuestion> for CandidateQuestion {
    fn from(item: GeneratedQuestion) -> Self {
        // Missing or negative indices become out of range so validation drops them.
        let correct_answer = item
            .correct_answer
            .and_then(|index| usize::try_from(index).ok())
            .unwrap_or(usize::MAX);
        CandidateQuestion::new(item.question, item.options, correct_answer, item.explanation)
    }
}

static RESPONSE_SCHEMA: Lazy<serde_json::Value> =
    Lazy::new(|| serde_json::to_value(schemars::schema_for!(GeneratedBatch)).unwrap_or_default());

static CODE_FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok());

/// Pulls the JSON payload out of a reply that may be wrapped in a markdown
/// code fence.
pub fn strip_code_fences(raw: &str) -> &str {
    CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| raw.trim())
}

pub fn parse_generated_batch(raw: &str) -> Result<Vec<CandidateQuestion>, GenerationError> {
    let batch: GeneratedBatch = serde_json::from_str(strip_code_fences(raw))?;
    Ok(batch.questions.into_iter().map(CandidateQuestion::from).collect())
}

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiQuestionGenerator {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiQuestionGenerator {
    pub fn new(api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// `None` when no credential is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .openai_api_key
            .clone()
            .map(|key| Self::new(key, &config.openai_base_url, &config.openai_model))
    }

    fn request_body(&self, prompt: &GeneratorPrompt) -> serde_json::Value {
        json!({
            "model": self.model,
            "temperature": 0.7,
            "messages": [
                { "role": "system", "content": QUIZ_SYSTEM_PROMPT },
                { "role": "user", "content": build_quiz_prompt(prompt) }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "quiz_questions",
                    "schema": RESPONSE_SCHEMA.clone(),
                    "strict": false
                }
            }
        })
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn try_generate(
        &self,
        prompt: &GeneratorPrompt,
    ) -> Result<Vec<CandidateQuestion>, GenerationError> {
        log::info!(
            "Requesting {} {} questions on '{}' from {} (grounded: {})",
            prompt.count,
            prompt.difficulty,
            prompt.topic,
            self.model,
            prompt.is_grounded()
        );

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GenerationError::Api("authentication failed".to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::Api("rate limited".to_string()));
        }
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Api(format!("{}: {}", status, text)));
        }

        #[derive(Deserialize)]
        struct Choices {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Msg,
        }
        #[derive(Deserialize)]
        struct Msg {
            content: Option<String>,
        }

        let parsed: Choices = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Api("response had no content".to_string()))?;

        parse_generated_batch(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_code_fence() {
        let raw = "Here you go:\n```json\n{\"questions\": []}\n```\n";
        assert_eq!(strip_code_fences(raw), "{\"questions\": []}");
    }

    #[test]
    fn leaves_plain_json_alone() {
        assert_eq!(strip_code_fences("  {\"questions\": []} "), "{\"questions\": []}");
    }

    #[test]
    fn parses_batch_and_marks_bad_indices_out_of_range() {
        let raw = r#"```
        {"questions": [
            {"question": "What is saving?", "options": ["a","b","c","d"], "correct_answer": 2, "explanation": "e"},
            {"question": "Negative?", "options": ["a","b","c","d"], "correct_answer": -1, "explanation": "e"},
            {"question": "Missing?", "options": ["a","b","c","d"], "explanation": "e"}
        ]}
        ```"#;

        let batch = parse_generated_batch(raw).expect("parse");
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].correct_answer, 2);
        assert!(batch[0].is_well_formed());
        assert!(!batch[1].is_well_formed());
        assert!(!batch[2].is_well_formed());
    }

    #[test]
    fn unparseable_reply_is_malformed() {
        assert!(matches!(
            parse_generated_batch("I cannot help with that."),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn schema_describes_questions_array() {
        let schema = RESPONSE_SCHEMA.to_string();
        assert!(schema.contains("questions"));
        assert!(schema.contains("correct_answer"));
    }

    #[test]
    fn generator_requires_a_credential() {
        let config = Config::test_config();
        assert!(OpenAiQuestionGenerator::from_config(&config).is_none());

        let mut with_key = Config::test_config();
        with_key.openai_api_key = Some(SecretString::from("sk-test".to_string()));
        assert!(OpenAiQuestionGenerator::from_config(&with_key).is_some());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let generator =
            OpenAiQuestionGenerator::new(SecretString::from("sk-test".to_string()), "http://127.0.0.1:9", "m");
        let prompt = GeneratorPrompt {
            topic: "saving money".to_string(),
            difficulty: crate::models::domain::DifficultyLevel::Easy,
            count: 1,
            profile: crate::models::domain::UserProfile::default_for("u"),
            material: None,
            avoid: vec![],
        };

        assert!(matches!(
            generator.try_generate(&prompt).await,
            Err(GenerationError::Http(_))
        ));
    }
}
