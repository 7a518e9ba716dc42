use std::{collections::HashSet, sync::Arc, time::Duration};

use rand::{seq::SliceRandom, Rng};

use crate::{
    errors::GenerationError,
    models::domain::{CandidateQuestion, DifficultyLevel, Question, QuestionSource},
    repositories::CurriculumLibrary,
    services::{
        generation::{
            stages::{ContentStage, CurriculumStage, GenerativeStage, TemplateStage},
            validation::retain_well_formed,
            GenerationRequest, QuestionGenerator, TemplateBank,
        },
        mastery_filter::filter_mastered,
    },
};

/// Ordered fallback chain of question sources. The template stage is held
/// apart from the others so it always runs last.
pub struct GenerationPipeline {
    stages: Vec<Box<dyn ContentStage>>,
    templates: TemplateStage,
    stage_timeout: Duration,
}

impl GenerationPipeline {
    pub fn new(
        stages: Vec<Box<dyn ContentStage>>,
        templates: TemplateStage,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            stages,
            templates,
            stage_timeout,
        }
    }

    /// Curriculum, then generative, then templates.
    pub fn standard(
        curriculum: Arc<dyn CurriculumLibrary>,
        generator: Option<Arc<dyn QuestionGenerator>>,
        bank: Arc<TemplateBank>,
        stage_timeout: Duration,
    ) -> Self {
        let stages: Vec<Box<dyn ContentStage>> = vec![
            Box::new(CurriculumStage::new(curriculum, generator.clone())),
            Box::new(GenerativeStage::new(generator)),
        ];
        Self::new(stages, TemplateStage::new(bank), stage_timeout)
    }

    /// Returns exactly `request.count` questions. Nothing is handed back
    /// until every slot is filled; dropping the future abandons any call
    /// still in flight.
    pub async fn generate(&self, request: &GenerationRequest) -> Vec<Question> {
        let mut accepted: Vec<(CandidateQuestion, QuestionSource)> =
            Vec::with_capacity(request.count);
        let mut seen: HashSet<String> = HashSet::new();

        for stage in &self.stages {
            let remaining = request.count - accepted.len();
            if remaining == 0 {
                break;
            }

            let batch = match self.run_stage(stage.as_ref(), request, remaining).await {
                Ok(batch) => batch,
                Err(err) => {
                    log::warn!(
                        "Stage '{}' failed for topic '{}': {}",
                        stage.name(),
                        request.topic,
                        err
                    );
                    continue;
                }
            };

            let received = batch.len();
            let batch = retain_well_formed(batch, stage.name());
            let batch = filter_mastered(batch, &request.mastered);

            let mut taken = 0;
            for candidate in batch {
                if taken == remaining {
                    break;
                }
                if seen.insert(candidate.question.clone()) {
                    accepted.push((candidate, stage.source()));
                    taken += 1;
                }
            }

            log::info!(
                "Stage '{}' contributed {} of {} requested questions ({} received)",
                stage.name(),
                taken,
                remaining,
                received
            );
        }

        let remaining = request.count - accepted.len();
        if remaining > 0 {
            let filled = self.templates.fill(request, &seen, remaining);
            log::info!(
                "Template stage contributed {} questions for topic '{}' ({})",
                filled.len(),
                request.topic,
                request.difficulty
            );
            accepted.extend(filled.into_iter().map(|c| (c, QuestionSource::Template)));
        }

        finalize(accepted, request.difficulty)
    }

    async fn run_stage(
        &self,
        stage: &dyn ContentStage,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<CandidateQuestion>, GenerationError> {
        tokio::time::timeout(self.stage_timeout, stage.try_generate(request, count))
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.stage_timeout.as_secs())))
    }
}

fn finalize(
    accepted: Vec<(CandidateQuestion, QuestionSource)>,
    difficulty: DifficultyLevel,
) -> Vec<Question> {
    let mut rng = rand::thread_rng();
    accepted
        .into_iter()
        .map(|(candidate, source)| {
            Question::accept(shuffle_options(candidate, &mut rng), difficulty, source)
        })
        .collect()
}

/// Reorders the options at random and moves `correct_answer` along with the
/// correct option.
pub fn shuffle_options<R: Rng + ?Sized>(
    mut candidate: CandidateQuestion,
    rng: &mut R,
) -> CandidateQuestion {
    let mut order: Vec<usize> = (0..candidate.options.len()).collect();
    order.shuffle(rng);

    let Some(new_correct) = order.iter().position(|&i| i == candidate.correct_answer) else {
        return candidate;
    };

    let mut shuffled = Vec::with_capacity(order.len());
    for &i in &order {
        shuffled.push(std::mem::take(&mut candidate.options[i]));
    }
    candidate.options = shuffled;
    candidate.correct_answer = new_correct;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::MasteredQuestionSet,
        test_utils::fixtures::{candidate, generation_request},
    };
    use async_trait::async_trait;

    struct FixedStage {
        batch: Vec<CandidateQuestion>,
        source: QuestionSource,
    }

    #[async_trait]
    impl ContentStage for FixedStage {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn source(&self) -> QuestionSource {
            self.source
        }
        async fn try_generate(
            &self,
            _request: &GenerationRequest,
            _count: usize,
        ) -> Result<Vec<CandidateQuestion>, GenerationError> {
            Ok(self.batch.clone())
        }
    }

    struct FailingStage;

    #[async_trait]
    impl ContentStage for FailingStage {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn source(&self) -> QuestionSource {
            QuestionSource::Generative
        }
        async fn try_generate(
            &self,
            _request: &GenerationRequest,
            _count: usize,
        ) -> Result<Vec<CandidateQuestion>, GenerationError> {
            Err(GenerationError::Api("boom".to_string()))
        }
    }

    struct SlowStage;

    #[async_trait]
    impl ContentStage for SlowStage {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn source(&self) -> QuestionSource {
            QuestionSource::Curriculum
        }
        async fn try_generate(
            &self,
            _request: &GenerationRequest,
            _count: usize,
        ) -> Result<Vec<CandidateQuestion>, GenerationError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(vec![candidate("too late")])
        }
    }

    fn pipeline(stages: Vec<Box<dyn ContentStage>>) -> GenerationPipeline {
        let bank = Arc::new(TemplateBank::builtin().expect("builtin bank"));
        GenerationPipeline::new(
            stages,
            TemplateStage::new(bank),
            Duration::from_millis(100),
        )
    }

    fn fixed(texts: &[&str], source: QuestionSource) -> Box<dyn ContentStage> {
        Box::new(FixedStage {
            batch: texts.iter().map(|t| candidate(t)).collect(),
            source,
        })
    }

    fn texts(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.question.as_str()).collect()
    }

    #[tokio::test]
    async fn returns_exact_count_when_every_upstream_stage_fails() {
        let pipeline = pipeline(vec![Box::new(FailingStage), Box::new(FailingStage)]);

        for difficulty in DifficultyLevel::ALL {
            for count in [1, 5, 12] {
                let request = generation_request("anything", difficulty, count);
                let questions = pipeline.generate(&request).await;
                assert_eq!(questions.len(), count);
                assert!(questions.iter().all(|q| q.difficulty == difficulty));
            }
        }
    }

    #[tokio::test]
    async fn zero_count_returns_nothing() {
        let pipeline = pipeline(vec![fixed(&["q1"], QuestionSource::Curriculum)]);
        let request = generation_request("anything", DifficultyLevel::Easy, 0);

        assert!(pipeline.generate(&request).await.is_empty());
    }

    #[tokio::test]
    async fn budgeting_easy_falls_back_to_template_bank() {
        let pipeline = pipeline(vec![Box::new(FailingStage), Box::new(FailingStage)]);
        let request = generation_request("budgeting", DifficultyLevel::Easy, 5);

        let questions = pipeline.generate(&request).await;
        assert_eq!(questions.len(), 5);
        assert!(questions
            .iter()
            .all(|q| q.source == QuestionSource::Template));

        let bank = TemplateBank::builtin().expect("builtin bank");
        let bank_texts: Vec<&str> = bank
            .for_topic("budgeting", DifficultyLevel::Easy)
            .iter()
            .map(|t| t.question.as_str())
            .collect();
        assert!(texts(&questions).iter().all(|t| bank_texts.contains(t)));
    }

    #[tokio::test]
    async fn first_successful_stage_fills_the_quiz() {
        let pipeline = pipeline(vec![
            fixed(&["c1", "c2", "c3", "c4", "c5", "c6"], QuestionSource::Curriculum),
            Box::new(FailingStage),
        ]);
        let request = generation_request("saving money", DifficultyLevel::Medium, 5);

        let questions = pipeline.generate(&request).await;
        assert_eq!(texts(&questions), vec!["c1", "c2", "c3", "c4", "c5"]);
        assert!(questions
            .iter()
            .all(|q| q.source == QuestionSource::Curriculum));
    }

    #[tokio::test]
    async fn short_batches_fall_through_for_the_remainder() {
        let pipeline = pipeline(vec![
            fixed(&["c1", "c2"], QuestionSource::Curriculum),
            fixed(&["c2", "g1"], QuestionSource::Generative),
        ]);
        let request = generation_request("saving money", DifficultyLevel::Medium, 5);

        let questions = pipeline.generate(&request).await;
        assert_eq!(questions.len(), 5);
        assert_eq!(&texts(&questions)[..3], &["c1", "c2", "g1"]);
        assert_eq!(questions[0].source, QuestionSource::Curriculum);
        assert_eq!(questions[2].source, QuestionSource::Generative);
        assert!(questions[3..]
            .iter()
            .all(|q| q.source == QuestionSource::Template));
    }

    #[tokio::test]
    async fn malformed_candidates_do_not_count() {
        let mut broken = candidate("broken");
        broken.options.truncate(2);
        let pipeline = pipeline(vec![Box::new(FixedStage {
            batch: vec![broken, candidate("ok")],
            source: QuestionSource::Generative,
        })]);
        let request = generation_request("anything", DifficultyLevel::Easy, 2);

        let questions = pipeline.generate(&request).await;
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "ok");
        assert!(!texts(&questions).contains(&"broken"));
        assert_eq!(questions[1].source, QuestionSource::Template);
    }

    #[tokio::test]
    async fn mastered_generated_questions_are_filtered() {
        let pipeline = pipeline(vec![fixed(&["m1", "n1"], QuestionSource::Generative)]);
        let mut request = generation_request("anything", DifficultyLevel::Easy, 1);
        request.mastered = MasteredQuestionSet::from_texts_capped(["m1"], 30);

        let questions = pipeline.generate(&request).await;
        assert_eq!(texts(&questions), vec!["n1"]);
    }

    #[tokio::test]
    async fn timed_out_stage_falls_through() {
        let pipeline = pipeline(vec![
            Box::new(SlowStage),
            fixed(&["g1", "g2", "g3"], QuestionSource::Generative),
        ]);
        let request = generation_request("anything", DifficultyLevel::Hard, 3);

        let questions = pipeline.generate(&request).await;
        assert_eq!(texts(&questions), vec!["g1", "g2", "g3"]);
    }

    #[tokio::test]
    async fn slow_stage_reports_timeout() {
        let pipeline = pipeline(Vec::new());
        let request = generation_request("anything", DifficultyLevel::Hard, 3);

        let result = pipeline.run_stage(&SlowStage, &request, 3).await;
        assert!(matches!(result, Err(GenerationError::Timeout(_))));
    }

    #[tokio::test]
    async fn accepted_questions_pass_the_validation_gate() {
        let pipeline = pipeline(vec![]);
        let request = generation_request("saving money", DifficultyLevel::Medium, 5);

        for question in pipeline.generate(&request).await {
            let candidate = CandidateQuestion::new(
                question.question.clone(),
                question.options.clone(),
                question.correct_answer,
                question.explanation.clone(),
            );
            assert!(candidate.is_well_formed());
        }
    }

    #[test]
    fn shuffle_tracks_the_correct_option() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let original = candidate("q");
            let expected = original.options[original.correct_answer].clone();

            let shuffled = shuffle_options(original, &mut rng);
            assert_eq!(shuffled.options[shuffled.correct_answer], expected);
            assert_eq!(shuffled.options.len(), 4);
        }
    }

    #[tokio::test]
    async fn correct_answer_positions_are_near_uniform() {
        let pipeline = pipeline(vec![]);
        let request = generation_request("anything", DifficultyLevel::Medium, 8);

        let mut counts = [0usize; 4];
        for _ in 0..500 {
            for question in pipeline.generate(&request).await {
                counts[question.correct_answer] += 1;
            }
        }

        // 4000 samples, 1000 expected per position.
        for count in counts {
            assert!((800..=1200).contains(&count), "positions: {:?}", counts);
        }
    }
}
