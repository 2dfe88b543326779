use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::prelude::{NewVote, Profile, ProfileId, Vote, VoteCategory, VoteKey};
use crate::reputation::prelude::*;
use crate::reputation::score;

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub score: i64,
}

/// Body of a vote request; the category is checked here rather than by the extractor so an
/// unknown tier is a plain 400.
#[derive(Debug, Deserialize)]
pub struct CastVote {
    pub voter_id: ProfileId,
    pub profile_id: ProfileId,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileReputation {
    pub profile_id: ProfileId,
    pub counts: CategoryCounts,
    pub total_votes: i64,
    pub score: i64,
    pub badge: BadgeProgress,
}

#[instrument(skip(state))]
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> JsonResult<Vec<LeaderboardEntry>> {
    let board = LeaderboardBuilder::new(&*state.ledger, &*state.catalog, &state.badges)
        .compute_leaderboard()
        .await?;

    Ok(Json(board))
}

#[instrument(skip(state))]
pub async fn badge_ladder(State(state): State<Arc<AppState>>) -> Json<Vec<Badge>> {
    Json(state.badges.table().badges().to_vec())
}

#[instrument(skip(state))]
pub async fn current_badge(
    Query(param): Query<ScoreQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Option<Badge>> {
    Json(state.badges.current_badge(param.score).cloned())
}

#[instrument(skip(state))]
pub async fn badge_progress(
    Query(param): Query<ScoreQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<BadgeProgress> {
    Json(state.badges.progress(param.score))
}

#[instrument(skip(state))]
pub async fn profile_reputation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> JsonResult<ProfileReputation> {
    let profile = fetch_profile(&state, &id.into()).await?;

    let votes = state.ledger.list_votes().await?;
    let tally = score::tally_for(&votes, &profile.id);
    let badge = state.badges.progress(tally.score);

    Ok(Json(ProfileReputation {
        profile_id: tally.profile_id,
        counts: tally.counts,
        total_votes: tally.counts.total_votes(),
        score: tally.score,
        badge,
    }))
}

#[instrument(skip(state))]
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CastVote>,
) -> JsonResult<Vote> {
    let category: VoteCategory = body.category.parse()?;

    let voter = fetch_profile(&state, &body.voter_id).await?;
    let target = fetch_profile(&state, &body.profile_id).await?;
    state.policy.check_vote(&voter, &target)?;

    let vote = state
        .writer
        .upsert_vote(&NewVote {
            voter_id: voter.id,
            profile_id: target.id,
            category,
        })
        .await?;

    tracing::info!(
        voter = %vote.voter_id,
        profile = %vote.profile_id,
        category = %vote.category,
        "vote cast"
    );
    Ok(Json(vote))
}

#[instrument(skip(state))]
pub async fn retract_vote(
    State(state): State<Arc<AppState>>,
    Json(key): Json<VoteKey>,
) -> Result<StatusCode, RouteError> {
    let voter = fetch_profile(&state, &key.voter_id).await?;
    state.policy.check_retraction(&voter)?;

    if state.writer.retract_vote(&voter.id, &key.profile_id).await? {
        tracing::info!(voter = %voter.id, profile = %key.profile_id, "vote retracted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RouteError::NoSuchVote(key))
    }
}

async fn fetch_profile(state: &AppState, id: &ProfileId) -> Result<Profile, RouteError> {
    state
        .catalog
        .profiles_by_id(std::slice::from_ref(id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::UnknownProfile(id.clone()))
}
