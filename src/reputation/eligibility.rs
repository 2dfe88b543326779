//! Preconditions the vote write path enforces before a vote reaches the ledger.
//!
//! The ledger keeps one vote per `(voter, profile)` on its own (see [`VoteWriter`]); the guard
//! covers who may vote at all. Which subscription tiers may vote is a deployment decision, so the
//! rank gate is off unless configured.
//!
//! [`VoteWriter`]: crate::reputation::VoteWriter

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::profile::{Profile, ProfileId};
use crate::util::env::Env;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("profile '{0}' cannot vote for itself")]
    SelfVote(ProfileId),

    #[error("voter rank {actual} is below the required rank {required}")]
    RankTooLow { required: i32, actual: i32 },

    #[error("vote retraction is disabled")]
    RetractionDisabled,
}

pub trait VoteEligibilityGuard {
    fn check_vote(&self, voter: &Profile, target: &Profile) -> Result<(), VoteRejection>;

    fn check_retraction(&self, _voter: &Profile) -> Result<(), VoteRejection> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePolicy {
    pub allow_self_vote: bool,
    pub min_voter_rank: Option<i32>,
    pub allow_retraction: bool,
}

impl Default for VotePolicy {
    fn default() -> Self {
        Self {
            allow_self_vote: false,
            min_voter_rank: None,
            allow_retraction: true,
        }
    }
}

impl VotePolicy {
    pub fn from_env(env: &Env) -> Self {
        let defaults = Self::default();
        Self {
            allow_self_vote: env.vote_allow_self.unwrap_or(defaults.allow_self_vote),
            min_voter_rank: env.vote_min_rank.or(defaults.min_voter_rank),
            allow_retraction: env.vote_allow_retract.unwrap_or(defaults.allow_retraction),
        }
    }
}

impl VoteEligibilityGuard for VotePolicy {
    fn check_vote(&self, voter: &Profile, target: &Profile) -> Result<(), VoteRejection> {
        if !self.allow_self_vote && voter.id == target.id {
            return Err(VoteRejection::SelfVote(voter.id.clone()));
        }

        match self.min_voter_rank {
            Some(required) if voter.subscription_rank < required => {
                Err(VoteRejection::RankTooLow {
                    required,
                    actual: voter.subscription_rank,
                })
            }
            _ => Ok(()),
        }
    }

    fn check_retraction(&self, _voter: &Profile) -> Result<(), VoteRejection> {
        if self.allow_retraction {
            Ok(())
        } else {
            Err(VoteRejection::RetractionDisabled)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reputation::testing::profile;

    #[test]
    fn test_default_policy_blocks_self_vote_only() {
        let policy = VotePolicy::default();
        let (a, b) = (profile("a"), profile("b"));

        assert_eq!(
            policy.check_vote(&a, &a),
            Err(VoteRejection::SelfVote("a".into()))
        );
        assert_eq!(policy.check_vote(&a, &b), Ok(()));
        assert_eq!(policy.check_retraction(&a), Ok(()));
    }

    #[test]
    fn test_rank_gate() {
        let policy = VotePolicy {
            min_voter_rank: Some(2),
            ..Default::default()
        };

        let mut voter = profile("a");
        let target = profile("b");

        voter.subscription_rank = 1;
        assert_eq!(
            policy.check_vote(&voter, &target),
            Err(VoteRejection::RankTooLow {
                required: 2,
                actual: 1
            })
        );

        voter.subscription_rank = 2;
        assert_eq!(policy.check_vote(&voter, &target), Ok(()));
    }

    #[test]
    fn test_permissive_policy() {
        let policy = VotePolicy {
            allow_self_vote: true,
            allow_retraction: false,
            ..Default::default()
        };
        let a = profile("a");

        assert_eq!(policy.check_vote(&a, &a), Ok(()));
        assert_eq!(
            policy.check_retraction(&a),
            Err(VoteRejection::RetractionDisabled)
        );
    }
}
