//! Content generation: an ordered chain of question sources ending in a
//! static template bank that always fills the quiz.

pub mod openai_generator;
pub mod pipeline;
pub mod stages;
pub mod template_bank;
pub mod validation;

pub use openai_generator::{OpenAiQuestionGenerator, QuestionGenerator};
pub use pipeline::GenerationPipeline;
pub use stages::{ContentStage, CurriculumStage, GenerativeStage, TemplateStage};
pub use template_bank::TemplateBank;

use crate::constants::quiz_prompt::MAX_AVOID_EXAMPLES;
use crate::models::domain::{DifficultyLevel, MasteredQuestionSet, UserProfile};

/// Everything the pipeline needs to assemble one quiz.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub count: usize,
    pub profile: UserProfile,
    pub mastered: MasteredQuestionSet,
}

impl GenerationRequest {
    pub fn new(
        topic: &str,
        difficulty: DifficultyLevel,
        count: usize,
        profile: UserProfile,
        mastered: MasteredQuestionSet,
    ) -> Self {
        GenerationRequest {
            topic: topic.to_string(),
            difficulty,
            count,
            profile,
            mastered,
        }
    }
}

/// Input to a single call of the generative capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorPrompt {
    pub topic: String,
    pub difficulty: DifficultyLevel,
    pub count: usize,
    pub profile: UserProfile,
    /// Reference material to ground the questions in, if any.
    pub material: Option<String>,
    /// Recently mastered questions the model should steer away from.
    pub avoid: Vec<String>,
}

impl GeneratorPrompt {
    pub fn for_request(request: &GenerationRequest, count: usize, material: Option<String>) -> Self {
        GeneratorPrompt {
            topic: request.topic.clone(),
            difficulty: request.difficulty,
            count,
            profile: request.profile.clone(),
            material,
            avoid: request
                .mastered
                .iter()
                .take(MAX_AVOID_EXAMPLES)
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.material.is_some()
    }
}
