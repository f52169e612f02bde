//! HTTP API handlers

pub mod health;
pub mod jobs;
pub mod media;
pub mod voting;

pub use health::health_routes;
pub use jobs::job_routes;
pub use media::media_routes;
pub use voting::voting_routes;

use uuid::Uuid;

use crate::error::ApiError;

/// Job ids arrive as raw path segments; anything that is not a UUID cannot
/// name a job
pub(crate) fn parse_job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Job not found: {}", raw)))
}
