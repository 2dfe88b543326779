//! Vote tally → leaderboard → badge pipeline.
//!
//! Everything in here is recomputed from the vote ledger on every request; nothing is cached and
//! nothing here owns mutable state. The ledger and the profile catalog are reached through the
//! traits below so the pipeline can run against postgres or an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::listing::Listing;
use crate::db::models::profile::{Profile, ProfileId};
use crate::db::models::vote::{NewVote, Vote};

pub mod badge;
pub mod eligibility;
pub mod leaderboard;
pub mod score;

#[cfg(test)]
pub mod testing;

pub mod prelude {
    pub use crate::reputation::badge::{Badge, BadgeProgress, BadgeResolver, BadgeTable};
    pub use crate::reputation::eligibility::{VoteEligibilityGuard, VotePolicy, VoteRejection};
    pub use crate::reputation::leaderboard::{
        LEADERBOARD_LIMIT, LeaderboardBuilder, LeaderboardEntry, LeaderboardError,
    };
    pub use crate::reputation::score::{CategoryCounts, ScoreTally};
    pub use crate::reputation::{ProfileCatalog, StoreError, StoreResult, VoteLedger, VoteWriter};
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the vote ledger.
#[async_trait]
pub trait VoteLedger {
    /// Every vote row currently in the ledger, in no particular order.
    async fn list_votes(&self) -> StoreResult<Vec<Vote>>;
}

/// Write side of the vote ledger.
///
/// Implementations must keep at most one vote per `(voter_id, profile_id)`: casting again for
/// the same pair replaces the earlier vote. The aggregator sums every row it is handed and relies
/// on this.
#[async_trait]
pub trait VoteWriter {
    async fn upsert_vote(&self, vote: &NewVote) -> StoreResult<Vote>;

    /// Removes the pair's vote, returning whether one existed.
    async fn retract_vote(&self, voter_id: &ProfileId, profile_id: &ProfileId)
    -> StoreResult<bool>;
}

/// Display-side lookups for profiles and their listings.
#[async_trait]
pub trait ProfileCatalog {
    async fn profiles_by_id(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>>;

    async fn listings_by_profile(&self, ids: &[ProfileId]) -> StoreResult<Vec<Listing>>;
}
