use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};
use tokio::sync::RwLock;

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Attempt, MasteredQuestionSet},
};

/// Append-only store of every quiz attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Writes the whole attempt in one operation; a partial attempt is never
    /// visible to readers.
    async fn append_attempt(&self, attempt: Attempt) -> AppResult<()>;
    /// All attempts for the user, newest first.
    async fn get_attempts(&self, user_id: &str) -> AppResult<Vec<Attempt>>;
    async fn get_mastered_question_texts(
        &self,
        user_id: &str,
        cap: usize,
    ) -> AppResult<MasteredQuestionSet>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_history".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_history_index).await?;

        log::info!("Successfully created indexes for attempts collection");
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for MongoAttemptRepository {
    async fn append_attempt(&self, attempt: Attempt) -> AppResult<()> {
        self.collection.insert_one(&attempt).await?;
        Ok(())
    }

    async fn get_attempts(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn get_mastered_question_texts(
        &self,
        user_id: &str,
        cap: usize,
    ) -> AppResult<MasteredQuestionSet> {
        if cap == 0 {
            return Ok(MasteredQuestionSet::new());
        }

        let pipeline = vec![
            doc! { "$match": { "user_id": user_id } },
            doc! { "$unwind": "$responses" },
            doc! { "$match": { "responses.is_correct": true, "responses.question": { "$ne": "" } } },
            doc! { "$group": { "_id": "$responses.question", "last_seen": { "$max": "$created_at" } } },
            doc! { "$sort": { "last_seen": -1, "_id": 1 } },
            doc! { "$limit": aggregation_limit(cap) },
        ];

        let rows: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;

        let texts = rows
            .iter()
            .filter_map(|row| row.get_str("_id").ok().map(str::to_string));
        Ok(MasteredQuestionSet::from_texts_capped(texts, cap))
    }
}

/// `$limit` takes a positive i64; caps beyond that range mean "no limit".
fn aggregation_limit(cap: usize) -> i64 {
    i64::try_from(cap).unwrap_or(i64::MAX)
}

/// Process-local history store. Appends take the write lock, so a reader
/// sees either the whole attempt or none of it.
#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts_by_user: RwLock<HashMap<String, Vec<Attempt>>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryAttemptRepository {
    async fn append_attempt(&self, attempt: Attempt) -> AppResult<()> {
        let mut attempts = self.attempts_by_user.write().await;
        attempts
            .entry(attempt.user_id.clone())
            .or_default()
            .push(attempt);
        Ok(())
    }

    async fn get_attempts(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts_by_user.read().await;
        let mut items = attempts.get(user_id).cloned().unwrap_or_default();
        items.reverse();
        Ok(items)
    }

    async fn get_mastered_question_texts(
        &self,
        user_id: &str,
        cap: usize,
    ) -> AppResult<MasteredQuestionSet> {
        let newest_first = self.get_attempts(user_id).await?;
        Ok(MasteredQuestionSet::from_attempts(&newest_first, cap))
    }
}
