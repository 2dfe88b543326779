use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::listing::Listing;
use crate::db::models::profile::{Profile, ProfileId};
use crate::db::repositories::Repository;
use crate::db::repositories::listing::ListingRepository;
use crate::reputation::{ProfileCatalog, StoreResult};

#[derive(Debug)]
pub struct ProfileRepository {
    pool: &'static Pool<Postgres>,
}

#[async_trait]
impl Repository for ProfileRepository {
    type Output = Profile;

    const BASE_FIELDS: &'static str = sql_fragment::PROFILE_FIELDS;
    const TABLE_NAME: &'static str = "profile";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl ProfileRepository {
    #[instrument(skip(self, ids), fields(profiles = ids.len()))]
    pub async fn get_many_by_id(&self, ids: &[ProfileId]) -> SqlxResult<Vec<Profile>> {
        let keys: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        self.get_where_any("id", &keys).await
    }
}

#[async_trait]
impl ProfileCatalog for ProfileRepository {
    async fn profiles_by_id(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>> {
        Ok(self.get_many_by_id(ids).await.inspect_err(|e| {
            tracing::error!(error = ?e, "profile lookup failed");
        })?)
    }

    async fn listings_by_profile(&self, ids: &[ProfileId]) -> StoreResult<Vec<Listing>> {
        Ok(ListingRepository::new(self.pool)
            .get_by_profiles(ids)
            .await
            .inspect_err(|e| {
                tracing::error!(error = ?e, "listing lookup failed");
            })?)
    }
}
