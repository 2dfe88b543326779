//! In-memory ledger and catalog for exercising the pipeline without postgres.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use uuid::Uuid;

use crate::db::models::listing::Listing;
use crate::db::models::profile::{Profile, ProfileId};
use crate::db::models::vote::{NewVote, Vote};
use crate::reputation::{ProfileCatalog, StoreError, StoreResult, VoteLedger, VoteWriter};

fn epoch() -> NaiveDateTime {
    DateTime::from_timestamp(1_700_000_000, 0)
        .unwrap_or_default()
        .naive_utc()
}

pub fn profile(id: &str) -> Profile {
    Profile {
        id: id.into(),
        username: format!("user_{id}"),
        age: Some(30),
        verified: false,
        subscription_rank: 0,
        created_at: epoch(),
    }
}

pub fn listing(profile_id: &str, status: &str) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        profile_id: profile_id.into(),
        status: status.to_string(),
        photos: vec![format!("photos/{profile_id}.jpg")],
        location: "Lisbon".to_string(),
        video: None,
        created_at: epoch(),
    }
}

pub fn vote(profile_id: &str, voter_id: &str, category: &str) -> Vote {
    Vote {
        id: Uuid::new_v4(),
        profile_id: profile_id.into(),
        voter_id: voter_id.into(),
        category: category.to_string(),
        cast_at: epoch(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub votes: Mutex<Vec<Vote>>,
    pub profiles: Vec<Profile>,
    pub listings: Vec<Listing>,
    pub fail_ledger: bool,
    pub fail_catalog: bool,
}

impl MemoryStore {
    /// Adds a profile with one approved listing for each id.
    pub fn with_profiles<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        for id in ids {
            self.profiles.push(profile(id));
            self.listings.push(listing(id, "approved"));
        }
        self
    }

    pub fn with_votes(self, votes: impl IntoIterator<Item = Vote>) -> Self {
        self.votes
            .lock()
            .expect("vote store poisoned")
            .extend(votes);
        self
    }

    pub fn votes(&self) -> Vec<Vote> {
        self.votes.lock().expect("vote store poisoned").clone()
    }
}

#[async_trait]
impl VoteLedger for MemoryStore {
    async fn list_votes(&self) -> StoreResult<Vec<Vote>> {
        if self.fail_ledger {
            return Err(StoreError::Unavailable("ledger offline".into()));
        }
        Ok(self.votes())
    }
}

#[async_trait]
impl VoteWriter for MemoryStore {
    async fn upsert_vote(&self, new: &NewVote) -> StoreResult<Vote> {
        if self.fail_ledger {
            return Err(StoreError::Unavailable("ledger offline".into()));
        }

        let mut votes = self.votes.lock().expect("vote store poisoned");
        votes.retain(|v| !(v.voter_id == new.voter_id && v.profile_id == new.profile_id));

        let stored = Vote {
            id: Uuid::new_v4(),
            profile_id: new.profile_id.clone(),
            voter_id: new.voter_id.clone(),
            category: new.category.as_str().to_string(),
            cast_at: epoch(),
        };
        votes.push(stored.clone());

        Ok(stored)
    }

    async fn retract_vote(
        &self,
        voter_id: &ProfileId,
        profile_id: &ProfileId,
    ) -> StoreResult<bool> {
        let mut votes = self.votes.lock().expect("vote store poisoned");
        let before = votes.len();
        votes.retain(|v| !(&v.voter_id == voter_id && &v.profile_id == profile_id));

        Ok(votes.len() != before)
    }
}

#[async_trait]
impl ProfileCatalog for MemoryStore {
    async fn profiles_by_id(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>> {
        if self.fail_catalog {
            return Err(StoreError::Unavailable("catalog offline".into()));
        }
        Ok(self
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn listings_by_profile(&self, ids: &[ProfileId]) -> StoreResult<Vec<Listing>> {
        if self.fail_catalog {
            return Err(StoreError::Unavailable("catalog offline".into()));
        }
        Ok(self
            .listings
            .iter()
            .filter(|l| ids.contains(&l.profile_id))
            .cloned()
            .collect())
    }
}
