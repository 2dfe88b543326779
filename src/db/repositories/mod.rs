use core::fmt;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

pub mod listing;
pub mod profile;
pub mod vote;

pub mod sql_fragment {
    pub const PROFILE_FIELDS: &str = r#"
        id,
        username,
        age,
        verified,
        subscription_rank,
        created_at
    "#;

    pub const LISTING_FIELDS: &str = r#"
        id,
        profile_id,
        status,
        photos,
        location,
        video,
        created_at
    "#;

    pub const VOTE_FIELDS: &str = r#"
        id,
        profile_id,
        voter_id,
        category,
        cast_at
    "#;
}

/// Base methods shared by the catalog tables
#[async_trait]
pub trait Repository {
    type Output: for<'r> sqlx::FromRow<'r, <Postgres as sqlx::Database>::Row>
        + Sized
        + Unpin
        + Send
        + fmt::Debug;

    const BASE_FIELDS: &'static str;
    const TABLE_NAME: &'static str;
    /// Ordering applied to multi-row reads.
    const ORDER_BY: &'static str = "id ASC";

    fn new(pool: &'static Pool<Postgres>) -> Self
    where
        Self: Sized;

    fn pool(&self) -> &'static Pool<Postgres>;

    /// Every row whose text `column` matches one of `keys`, in one round trip.
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    async fn get_where_any(
        &self,
        column: &'static str,
        keys: &[String],
    ) -> SqlxResult<Vec<Self::Output>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Self::Output>(&format!(
            "SELECT {} FROM {} WHERE {} = ANY($1) ORDER BY {}",
            Self::BASE_FIELDS,
            Self::TABLE_NAME,
            column,
            Self::ORDER_BY,
        ))
        .bind(keys)
        .fetch_all(self.pool())
        .await
    }
}
