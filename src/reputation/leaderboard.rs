use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::db::models::listing::Listing;
use crate::db::models::profile::{Profile, ProfileId};
use crate::reputation::badge::{BadgeProgress, BadgeResolver};
use crate::reputation::score::{self, CategoryCounts, ScoreTally};
use crate::reputation::{ProfileCatalog, StoreError, VoteLedger};

pub const LEADERBOARD_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("vote ledger read failed: {0}")]
    Ledger(#[source] StoreError),

    #[error("profile catalog read failed: {0}")]
    Catalog(#[source] StoreError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position in the published board.
    pub ranking: i64,
    pub id: ProfileId,
    pub username: String,
    pub age: Option<i32>,
    pub verified: bool,
    pub subscription_rank: i32,
    pub listing_id: Uuid,
    pub photos: Vec<String>,
    pub location: String,
    pub video: Option<String>,
    pub listed_at: NaiveDateTime,
    pub counts: CategoryCounts,
    pub score: i64,
    pub badge: BadgeProgress,
}

impl LeaderboardEntry {
    fn assemble(
        ranking: i64,
        profile: Profile,
        listing: Listing,
        tally: ScoreTally,
        badge: BadgeProgress,
    ) -> Self {
        Self {
            ranking,
            id: profile.id,
            username: profile.username,
            age: profile.age,
            verified: profile.verified,
            subscription_rank: profile.subscription_rank,
            listing_id: listing.id,
            photos: listing.photos,
            location: listing.location,
            video: listing.video,
            listed_at: listing.created_at,
            counts: tally.counts,
            score: tally.score,
            badge,
        }
    }
}

pub struct LeaderboardBuilder<'a, L: ?Sized, C: ?Sized> {
    ledger: &'a L,
    catalog: &'a C,
    badges: &'a BadgeResolver,
}

impl<'a, L, C> LeaderboardBuilder<'a, L, C>
where
    L: VoteLedger + Sync + ?Sized,
    C: ProfileCatalog + Sync + ?Sized,
{
    pub fn new(ledger: &'a L, catalog: &'a C, badges: &'a BadgeResolver) -> Self {
        Self {
            ledger,
            catalog,
            badges,
        }
    }

    /// Top profiles by score, each paired with one listing and annotated with its badge.
    ///
    /// An empty ledger gives an empty board. Any collaborator failure aborts the whole build.
    #[instrument(skip(self))]
    pub async fn compute_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let votes = self
            .ledger
            .list_votes()
            .await
            .map_err(LeaderboardError::Ledger)?;

        let tallies = score::aggregate(&votes);
        if tallies.is_empty() {
            tracing::debug!("no votes cast yet, leaderboard is empty");
            return Ok(Vec::new());
        }

        let ranked = rank_tallies(tallies.into_values().collect());
        let ids: Vec<ProfileId> = ranked.iter().map(|t| t.profile_id.clone()).collect();

        let mut profiles: HashMap<ProfileId, Profile> = self
            .catalog
            .profiles_by_id(&ids)
            .await
            .map_err(LeaderboardError::Catalog)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut listings: HashMap<ProfileId, Vec<Listing>> = HashMap::new();
        for listing in self
            .catalog
            .listings_by_profile(&ids)
            .await
            .map_err(LeaderboardError::Catalog)?
        {
            listings
                .entry(listing.profile_id.clone())
                .or_default()
                .push(listing);
        }

        let mut entries = Vec::with_capacity(ranked.len());
        for tally in ranked {
            let Some(listing) = listings
                .remove(&tally.profile_id)
                .and_then(representative_listing)
            else {
                tracing::debug!(profile = %tally.profile_id, "no listing to display, skipping");
                continue;
            };

            let Some(profile) = profiles.remove(&tally.profile_id) else {
                tracing::warn!(profile = %tally.profile_id, "voted profile missing from catalog");
                continue;
            };

            let badge = self.badges.progress(tally.score);
            let ranking = entries.len() as i64 + 1;
            entries.push(LeaderboardEntry::assemble(
                ranking, profile, listing, tally, badge,
            ));
        }

        tracing::debug!(entries = entries.len(), "built leaderboard");
        Ok(entries)
    }
}

/// Orders tallies by score, highest first, with ties broken by ascending profile id, and keeps
/// the first [`LEADERBOARD_LIMIT`].
pub fn rank_tallies(mut tallies: Vec<ScoreTally>) -> Vec<ScoreTally> {
    tallies.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });
    tallies.truncate(LEADERBOARD_LIMIT);
    tallies
}

/// First approved listing, otherwise the first listing seen.
pub fn representative_listing(mut listings: Vec<Listing>) -> Option<Listing> {
    if listings.is_empty() {
        return None;
    }

    let idx = listings
        .iter()
        .position(Listing::is_approved)
        .unwrap_or_default();

    Some(listings.swap_remove(idx))
}
