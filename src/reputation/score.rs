use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::models::profile::ProfileId;
use crate::db::models::vote::{Vote, VoteCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub top1: i64,
    pub top5: i64,
    pub top10: i64,
    pub top50: i64,
}

impl CategoryCounts {
    pub fn get(&self, category: VoteCategory) -> i64 {
        match category {
            VoteCategory::Top1 => self.top1,
            VoteCategory::Top5 => self.top5,
            VoteCategory::Top10 => self.top10,
            VoteCategory::Top50 => self.top50,
        }
    }

    fn bump(&mut self, category: VoteCategory) {
        let slot = match category {
            VoteCategory::Top1 => &mut self.top1,
            VoteCategory::Top5 => &mut self.top5,
            VoteCategory::Top10 => &mut self.top10,
            VoteCategory::Top50 => &mut self.top50,
        };
        *slot += 1;
    }

    pub fn total_votes(&self) -> i64 {
        self.top1 + self.top5 + self.top10 + self.top50
    }

    pub fn weighted(&self) -> i64 {
        VoteCategory::ALL
            .into_iter()
            .map(|c| c.weight() * self.get(c))
            .sum()
    }
}

/// Per-profile result of folding the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    pub profile_id: ProfileId,
    pub counts: CategoryCounts,
    pub score: i64,
}

impl ScoreTally {
    pub fn empty(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            counts: CategoryCounts::default(),
            score: 0,
        }
    }

    fn record(&mut self, category: VoteCategory) {
        self.counts.bump(category);
        self.score += category.weight();
    }
}

/// Folds vote rows into one tally per voted-for profile.
///
/// Every row is counted: the input must already hold at most one vote per
/// `(voter_id, profile_id)`. A profile is given a tally the first time it is seen, even if all of
/// its votes carry a category this build doesn't recognise; those votes add nothing.
pub fn aggregate<'a, I>(votes: I) -> HashMap<ProfileId, ScoreTally>
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut tallies: HashMap<ProfileId, ScoreTally> = HashMap::new();

    for vote in votes {
        let tally = tallies
            .entry(vote.profile_id.clone())
            .or_insert_with(|| ScoreTally::empty(vote.profile_id.clone()));

        match vote.category() {
            Some(category) => tally.record(category),
            None => {
                tracing::debug!(
                    vote = %vote.id,
                    category = %vote.category,
                    "ignoring vote with unrecognised category"
                );
            }
        }
    }

    tallies
}

/// Tally for a single profile; a profile nobody voted for gets an empty tally.
pub fn tally_for<'a, I>(votes: I, profile_id: &ProfileId) -> ScoreTally
where
    I: IntoIterator<Item = &'a Vote>,
{
    aggregate(votes.into_iter().filter(|v| &v.profile_id == profile_id))
        .remove(profile_id)
        .unwrap_or_else(|| ScoreTally::empty(profile_id.clone()))
}
