use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        CurriculumLibrary, HistoryRepository, InMemoryAttemptRepository, InMemoryCurriculum,
        InMemoryProfileRepository, MongoAttemptRepository, MongoProfileRepository,
        ProfileRepository,
    },
    services::{
        generation::{GenerationPipeline, OpenAiQuestionGenerator, QuestionGenerator, TemplateBank},
        AdaptiveQuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<AdaptiveQuizService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the engine against MongoDB.
    pub async fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        let db = Database::connect(&config).await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db, &config.attempts_collection));
        attempt_repository.ensure_indexes().await?;

        let profile_repository = Arc::new(MongoProfileRepository::new(&db, &config.profiles_collection));
        profile_repository.ensure_indexes().await?;

        Self::assemble(config, attempt_repository, profile_repository)
    }

    /// Same object graph over process-local stores.
    pub fn in_memory(config: Config) -> AppResult<Self> {
        config.validate()?;
        Self::assemble(
            config,
            Arc::new(InMemoryAttemptRepository::new()),
            Arc::new(InMemoryProfileRepository::new()),
        )
    }

    fn assemble(
        config: Config,
        history: Arc<dyn HistoryRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> AppResult<Self> {
        let bank = TemplateBank::builtin()?;
        bank.validate()?;

        let curriculum: Arc<dyn CurriculumLibrary> = match &config.curriculum_dir {
            Some(dir) => Arc::new(InMemoryCurriculum::from_dir(dir)?),
            None => {
                log::info!("CURRICULUM_DIR not set, curriculum-grounded questions disabled");
                Arc::new(InMemoryCurriculum::new())
            }
        };

        let generator: Option<Arc<dyn QuestionGenerator>> =
            match OpenAiQuestionGenerator::from_config(&config) {
                Some(generator) => Some(Arc::new(generator)),
                None => {
                    log::info!("OPENAI_API_KEY not set, generative stages will be skipped");
                    None
                }
            };

        let pipeline = Arc::new(GenerationPipeline::standard(
            curriculum,
            generator,
            Arc::new(bank),
            config.generation_timeout(),
        ));

        let quiz_service = Arc::new(AdaptiveQuizService::new(
            history,
            profiles,
            pipeline,
            config.quiz_size,
            config.mastered_question_cap,
        ));

        Ok(Self {
            quiz_service,
            config: Arc::new(config),
        })
    }
}
