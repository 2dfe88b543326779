use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::listing::Listing;
use crate::db::models::profile::ProfileId;
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct ListingRepository {
    pool: &'static Pool<Postgres>,
}

#[async_trait::async_trait]
impl Repository for ListingRepository {
    type Output = Listing;

    const BASE_FIELDS: &'static str = sql_fragment::LISTING_FIELDS;
    const TABLE_NAME: &'static str = "listing";
    // "first seen" listing for a profile is its oldest one
    const ORDER_BY: &'static str = "created_at ASC, id ASC";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl ListingRepository {
    #[instrument(skip(self, ids), fields(profiles = ids.len()))]
    pub async fn get_by_profiles(&self, ids: &[ProfileId]) -> SqlxResult<Vec<Listing>> {
        let keys: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        self.get_where_any("profile_id", &keys).await
    }
}
