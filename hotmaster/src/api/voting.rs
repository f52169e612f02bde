//! Hot-or-not voting endpoints
//!
//! POST /jobs/:job_id/votes, GET /jobs/:job_id/rankings,
//! GET /jobs/:job_id/next-comparison

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::parse_job_id;
use crate::error::{ApiError, ApiResult};
use crate::models::Candidate;
use crate::AppState;

/// POST /jobs/:job_id/votes request
///
/// Older clients also send `job_id` in the body; it is ignored in favour of
/// the path.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub rankings: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<Candidate>,
    pub candidates_by_id: BTreeMap<String, Candidate>,
}

/// Candidate as offered for comparison
#[derive(Debug, Serialize)]
pub struct ComparisonEntry {
    pub id: String,
    pub reference_index: usize,
}

impl From<Candidate> for ComparisonEntry {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            reference_index: candidate.reference_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub candidate_a: ComparisonEntry,
    pub candidate_b: ComparisonEntry,
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {}", name)))
}

/// POST /jobs/:job_id/votes
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let job_id = parse_job_id(&job_id)?;
    let winner_id = required(request.winner_id, "winner_id")?;
    let loser_id = required(request.loser_id, "loser_id")?;

    let rankings = state.voting.record_vote(job_id, &winner_id, &loser_id).await?;
    Ok(Json(VoteResponse {
        success: true,
        rankings,
    }))
}

/// GET /jobs/:job_id/rankings
pub async fn get_rankings(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<RankingsResponse>> {
    let job_id = parse_job_id(&job_id)?;
    let standings = state.voting.standings(job_id).await?;

    Ok(Json(RankingsResponse {
        rankings: standings.rankings,
        candidates_by_id: standings.candidates_by_id,
    }))
}

/// GET /jobs/:job_id/next-comparison
pub async fn get_next_comparison(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ComparisonResponse>> {
    let job_id = parse_job_id(&job_id)?;
    let comparison = state.voting.next_pair(job_id).await?;

    Ok(Json(ComparisonResponse {
        candidate_a: comparison.candidate_a.into(),
        candidate_b: comparison.candidate_b.into(),
    }))
}

pub fn voting_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/:job_id/votes", post(submit_vote))
        .route("/jobs/:job_id/rankings", get(get_rankings))
        .route("/jobs/:job_id/next-comparison", get(get_next_comparison))
}
