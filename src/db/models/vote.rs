use core::fmt;
use core::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::profile::ProfileId;

/// The four fixed tiers a voter can place a profile in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteCategory {
    Top1,
    Top5,
    Top10,
    Top50,
}

impl VoteCategory {
    pub const ALL: [VoteCategory; 4] = [
        VoteCategory::Top1,
        VoteCategory::Top5,
        VoteCategory::Top10,
        VoteCategory::Top50,
    ];

    /// Points a single vote in this category contributes to a profile's score.
    pub const fn weight(self) -> i64 {
        match self {
            VoteCategory::Top1 => 50,
            VoteCategory::Top5 => 20,
            VoteCategory::Top10 => 10,
            VoteCategory::Top50 => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            VoteCategory::Top1 => "top1",
            VoteCategory::Top5 => "top5",
            VoteCategory::Top10 => "top10",
            VoteCategory::Top50 => "top50",
        }
    }

    /// Lenient parse used when reading the ledger: anything unrecognised is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown vote category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for VoteCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for VoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base vote table model
///
/// `category` stays a raw string here: rows written by older or newer writers may carry a
/// category this build doesn't know about.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub voter_id: ProfileId,
    pub category: String,
    pub cast_at: NaiveDateTime,
}

impl Vote {
    pub fn category(&self) -> Option<VoteCategory> {
        VoteCategory::parse(&self.category)
    }
}

/// Write-side request to place (or replace) a vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVote {
    pub voter_id: ProfileId,
    pub profile_id: ProfileId,
    pub category: VoteCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteKey {
    pub voter_id: ProfileId,
    pub profile_id: ProfileId,
}
