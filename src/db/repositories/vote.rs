use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;
use uuid::Uuid;

use super::sql_fragment;
use crate::db::models::profile::ProfileId;
use crate::db::models::vote::{NewVote, Vote};
use crate::reputation::{StoreError, StoreResult, VoteLedger, VoteWriter};

pub struct VoteRepository {
    pool: &'static Pool<Postgres>,
}

impl VoteRepository {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> SqlxResult<Vec<Vote>> {
        sqlx::query_as::<_, Vote>(&format!(
            "SELECT {} FROM vote",
            sql_fragment::VOTE_FIELDS
        ))
        .fetch_all(self.pool)
        .await
    }

    /// Places `vote`, replacing whatever the voter previously cast for the same profile.
    #[instrument(skip(self, vote), fields(voter = %vote.voter_id, profile = %vote.profile_id))]
    pub async fn upsert(&self, vote: &NewVote) -> SqlxResult<Vote> {
        sqlx::query_as::<_, Vote>(&format!(
            r#"
            INSERT INTO vote (
                id,
                profile_id,
                voter_id,
                category,
                cast_at
            )
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (voter_id, profile_id)
            DO UPDATE SET
                category = EXCLUDED.category,
                cast_at = NOW()
            RETURNING {}
            "#,
            sql_fragment::VOTE_FIELDS
        ))
        .bind(Uuid::new_v4())
        .bind(&vote.profile_id)
        .bind(&vote.voter_id)
        .bind(vote.category.as_str())
        .fetch_one(self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, "vote upsert failure");
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, voter_id: &ProfileId, profile_id: &ProfileId) -> SqlxResult<bool> {
        let res = sqlx::query("DELETE FROM vote WHERE voter_id = $1 AND profile_id = $2")
            .bind(voter_id)
            .bind(profile_id)
            .execute(self.pool)
            .await?;

        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl VoteLedger for VoteRepository {
    async fn list_votes(&self) -> StoreResult<Vec<Vote>> {
        if self.pool.is_closed() {
            return Err(StoreError::Unavailable("postgres pool is closed".into()));
        }

        Ok(self.get_all().await.inspect_err(|e| {
            tracing::error!(error = ?e, "vote ledger read failure");
        })?)
    }
}

#[async_trait]
impl VoteWriter for VoteRepository {
    async fn upsert_vote(&self, vote: &NewVote) -> StoreResult<Vote> {
        Ok(self.upsert(vote).await?)
    }

    async fn retract_vote(
        &self,
        voter_id: &ProfileId,
        profile_id: &ProfileId,
    ) -> StoreResult<bool> {
        Ok(self.delete(voter_id, profile_id).await?)
    }
}
