//! Job submission and status
//!
//! POST /jobs, GET /jobs/:job_id/status

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use hotmaster_common::LimiterOverrides;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::parse_job_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{JobStatus, ReferenceError, ReferenceResult};
use crate::services::{JobRequest, MAX_REFERENCES};
use crate::storage::has_allowed_extension;
use crate::AppState;

/// Upper bound for one upload request (target plus ten references)
const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

/// POST /jobs response
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
    pub total_references: usize,
    pub status: JobStatus,
}

/// GET /jobs/:job_id/status response
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub completed: usize,
    pub results: Vec<ReferenceResult>,
    pub errors: Vec<ReferenceError>,
    pub limiter_settings: LimiterOverrides,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct UploadedFile {
    file_name: String,
    data: Vec<u8>,
}

/// Order key for a `reference_N` field; unnumbered fields go last
fn reference_number(field_name: &str) -> usize {
    field_name
        .trim_start_matches("reference")
        .trim_start_matches('_')
        .parse()
        .unwrap_or(usize::MAX)
}

/// POST /jobs
///
/// Multipart upload: `target`, `reference_1` … `reference_10` and optional
/// `limiter_*` fields. Processing starts in the background.
pub async fn create_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<CreateJobResponse>> {
    let mut target: Option<UploadedFile> = None;
    let mut references: Vec<(usize, UploadedFile)> = Vec::new();
    let mut form: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e)))?;

        match (field_name.as_str(), file_name) {
            ("target", Some(file_name)) if !file_name.is_empty() => {
                target = Some(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            (name, Some(file_name)) if name.starts_with("reference") => {
                if !file_name.is_empty() {
                    references.push((
                        reference_number(name),
                        UploadedFile {
                            file_name,
                            data: data.to_vec(),
                        },
                    ));
                }
            }
            (name, None) => {
                form.insert(name.to_string(), String::from_utf8_lossy(&data).to_string());
            }
            _ => {}
        }
    }

    let target = target.ok_or_else(|| ApiError::BadRequest("No target file provided".to_string()))?;
    if references.is_empty() {
        return Err(ApiError::BadRequest("At least one reference file is required".to_string()));
    }
    if references.len() > MAX_REFERENCES {
        return Err(ApiError::BadRequest(format!(
            "At most {} reference files are allowed",
            MAX_REFERENCES
        )));
    }
    for file in std::iter::once(&target).chain(references.iter().map(|(_, f)| f)) {
        if !has_allowed_extension(&file.file_name) {
            return Err(ApiError::BadRequest(format!("Unsupported file type: {}", file.file_name)));
        }
    }

    let overrides = LimiterOverrides::from_form(&form)?;
    references.sort_by_key(|(number, _)| *number);

    let job_id = Uuid::new_v4();
    let layout = &state.layout;
    tokio::fs::create_dir_all(layout.upload_dir(job_id)).await?;

    let target_path = layout.target_upload_path(job_id, &target.file_name);
    tokio::fs::write(&target_path, &target.data).await?;

    let mut reference_paths = Vec::with_capacity(references.len());
    for (position, (_, file)) in references.iter().enumerate() {
        let path = layout.reference_upload_path(job_id, position + 1, &file.file_name);
        tokio::fs::write(&path, &file.data).await?;
        reference_paths.push(path);
    }

    let total_references = reference_paths.len();
    let request = JobRequest {
        target_path,
        reference_paths,
        overrides,
    };
    if let Err(e) = state.orchestrator.submit_with_id(job_id, request).await {
        warn!(job_id = %job_id, error = %e, "Job rejected");
        let _ = tokio::fs::remove_dir_all(layout.upload_dir(job_id)).await;
        return Err(e.into());
    }

    info!(
        job_id = %job_id,
        target = %target.file_name,
        total_references,
        "Job created"
    );

    Ok(Json(CreateJobResponse {
        job_id,
        total_references,
        status: JobStatus::Processing,
    }))
}

/// GET /jobs/:job_id/status
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = parse_job_id(&job_id)?;
    let job = state
        .orchestrator
        .status(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        total: job.total,
        completed: job.completed,
        results: job.results,
        errors: job.errors,
        limiter_settings: job.limiter_settings,
        created_at: job.created_at,
        finished_at: job.finished_at,
    }))
}

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/jobs",
            post(create_job).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/jobs/:job_id/status", get(get_job_status))
}
