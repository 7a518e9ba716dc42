use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};
use tokio::sync::RwLock;

use crate::{db::Database, errors::AppResult, models::domain::UserProfile};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<UserProfile>>;
    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile>;
}

pub struct MongoProfileRepository {
    collection: Collection<UserProfile>,
}

impl MongoProfileRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for profiles collection");

        let user_id_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_id_index).await?;

        log::info!("Successfully created indexes for profiles collection");
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MongoProfileRepository {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let profile = self.collection.find_one(doc! { "user_id": user_id }).await?;
        Ok(profile)
    }

    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile> {
        self.collection
            .replace_one(doc! { "user_id": &profile.user_id }, &profile)
            .upsert(true)
            .await?;
        Ok(profile)
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }

    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }
}
