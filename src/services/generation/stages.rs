use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;

use crate::{
    errors::GenerationError,
    models::domain::{CandidateQuestion, QuestionSource},
    repositories::CurriculumLibrary,
    services::generation::{GenerationRequest, GeneratorPrompt, QuestionGenerator, TemplateBank},
};

/// One source in the fallback chain. A stage may return fewer items than
/// asked for; the pipeline takes what it can and asks the next stage for
/// the rest.
#[async_trait]
pub trait ContentStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn source(&self) -> QuestionSource;
    async fn try_generate(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<CandidateQuestion>, GenerationError>;
}

/// Questions grounded in age-appropriate curriculum material.
pub struct CurriculumStage {
    library: Arc<dyn CurriculumLibrary>,
    generator: Option<Arc<dyn QuestionGenerator>>,
}

impl CurriculumStage {
    pub fn new(
        library: Arc<dyn CurriculumLibrary>,
        generator: Option<Arc<dyn QuestionGenerator>>,
    ) -> Self {
        Self { library, generator }
    }
}

#[async_trait]
impl ContentStage for CurriculumStage {
    fn name(&self) -> &'static str {
        "curriculum"
    }

    fn source(&self) -> QuestionSource {
        QuestionSource::Curriculum
    }

    async fn try_generate(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<CandidateQuestion>, GenerationError> {
        let age = request.profile.age;
        let material = self.library.material_for(age, &request.topic).ok_or_else(|| {
            GenerationError::NoMaterial {
                age,
                topic: request.topic.clone(),
            }
        })?;
        let generator = self.generator.as_ref().ok_or(GenerationError::Unavailable)?;

        let prompt = GeneratorPrompt::for_request(request, count, Some(material));
        generator.try_generate(&prompt).await
    }
}

/// Ungrounded generation from topic, difficulty and profile alone.
pub struct GenerativeStage {
    generator: Option<Arc<dyn QuestionGenerator>>,
}

impl GenerativeStage {
    pub fn new(generator: Option<Arc<dyn QuestionGenerator>>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ContentStage for GenerativeStage {
    fn name(&self) -> &'static str {
        "generative"
    }

    fn source(&self) -> QuestionSource {
        QuestionSource::Generative
    }

    async fn try_generate(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<CandidateQuestion>, GenerationError> {
        let generator = self.generator.as_ref().ok_or(GenerationError::Unavailable)?;

        let prompt = GeneratorPrompt::for_request(request, count, None);
        generator.try_generate(&prompt).await
    }
}

/// Terminal stage. Always returns exactly `count` templates as long as the
/// bank passed `TemplateBank::validate`.
pub struct TemplateStage {
    bank: Arc<TemplateBank>,
}

impl TemplateStage {
    pub fn new(bank: Arc<TemplateBank>) -> Self {
        Self { bank }
    }

    /// Fills `count` slots from distinct templates: unmastered ones first,
    /// then mastered ones, then texts already in `accepted`. Templates repeat
    /// only when the whole bank is smaller than `count`.
    pub fn fill(
        &self,
        request: &GenerationRequest,
        accepted: &HashSet<String>,
        count: usize,
    ) -> Vec<CandidateQuestion> {
        if count == 0 {
            return Vec::new();
        }

        let templates = self.bank.for_topic(&request.topic, request.difficulty);

        let mut fresh = Vec::new();
        let mut mastered = Vec::new();
        let mut seen = Vec::new();
        for template in templates {
            if accepted.contains(&template.question) {
                seen.push(template);
            } else if request.mastered.contains(&template.question) {
                mastered.push(template);
            } else {
                fresh.push(template);
            }
        }
        if fresh.len() < count && !mastered.is_empty() {
            log::debug!(
                "Only {} unmastered templates for '{}' ({}), serving mastered ones too",
                fresh.len(),
                request.topic,
                request.difficulty
            );
        }
        let ordered: Vec<&CandidateQuestion> =
            fresh.into_iter().chain(mastered).chain(seen).collect();

        if ordered.len() < count {
            log::debug!(
                "Template bank for '{}' ({}) has {} questions, repeating to fill {}",
                request.topic,
                request.difficulty,
                ordered.len(),
                count
            );
        }

        ordered.into_iter().cycle().take(count).cloned().collect()
    }
}
