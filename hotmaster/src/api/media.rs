//! Audio file endpoints
//!
//! GET /jobs/:job_id/previews/:ref_idx/:variant,
//! GET /jobs/:job_id/downloads/:ref_idx/:format, GET /jobs/:job_id/original

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rand::Rng;
use std::path::Path as FsPath;
use tracing::debug;

use super::parse_job_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{DownloadFormat, Job, PreviewKey};
use crate::AppState;

async fn find_job(state: &AppState, raw_job_id: &str) -> ApiResult<Job> {
    let job_id = parse_job_id(raw_job_id)?;
    state
        .orchestrator
        .status(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))
}

fn content_type_for(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "aiff" => "audio/aiff",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

async fn read_audio(path: &FsPath, what: &str) -> ApiResult<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("{} not found", what)))
        }
        Err(e) => Err(e.into()),
    }
}

/// `"{stem} {CODE} Master{suffix}"` with a random five-letter code
pub fn download_filename(target: &FsPath, format: DownloadFormat) -> String {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    let mut rng = rand::thread_rng();
    let code: String = (0..5).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect();
    format!("{} {} Master{}", stem, code, format.download_suffix())
}

/// GET /jobs/:job_id/previews/:ref_idx/:variant
pub async fn get_preview(
    State(state): State<AppState>,
    Path((job_id, reference_index, variant)): Path<(String, usize, String)>,
) -> ApiResult<Response> {
    let job = find_job(&state, &job_id).await?;
    let key: PreviewKey = variant.parse().map_err(ApiError::BadRequest)?;

    let path = state.layout.preview_path(job.id, reference_index, key);
    let data = read_audio(&path, "Preview").await?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], data).into_response())
}

/// GET /jobs/:job_id/downloads/:ref_idx/:format
pub async fn get_download(
    State(state): State<AppState>,
    Path((job_id, reference_index, format)): Path<(String, usize, String)>,
) -> ApiResult<Response> {
    let job = find_job(&state, &job_id).await?;
    let format: DownloadFormat = format.parse().map_err(ApiError::BadRequest)?;

    let path = state.layout.result_path(job.id, reference_index, format);
    let data = read_audio(&path, "Mastered file").await?;

    let filename = download_filename(&job.target_path, format);
    debug!(job_id = %job.id, reference_index, %format, filename = %filename, "Serving download");

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    )
        .into_response())
}

/// GET /jobs/:job_id/original
pub async fn get_original(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job = find_job(&state, &job_id).await?;
    let data = read_audio(&job.target_path, "Original file").await?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&job.target_path))], data).into_response())
}

pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/:job_id/previews/:ref_idx/:variant", get(get_preview))
        .route("/jobs/:job_id/downloads/:ref_idx/:format", get(get_download))
        .route("/jobs/:job_id/original", get(get_original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename_shape() {
        let name = download_filename(FsPath::new("/uploads/x/My_Mix.wav"), DownloadFormat::Wav24Low);
        assert!(name.starts_with("My_Mix "));
        assert!(name.ends_with(" Master 24bit Low Loudness.wav"));

        let code = &name["My_Mix ".len().."My_Mix ".len() + 5];
        assert!(code.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for(FsPath::new("a.MP3")), "audio/mpeg");
        assert_eq!(content_type_for(FsPath::new("a.wav")), "audio/wav");
        assert_eq!(content_type_for(FsPath::new("a")), "application/octet-stream");
    }
}
