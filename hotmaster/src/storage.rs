//! On-disk layout for uploads, mastered results and previews
//!
//! Every path is derived from `(job_id, reference_index, key)` so nothing
//! besides the job id needs to be remembered to find a file again.

use hotmaster_common::config::DataFolders;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{DownloadFormat, PreviewKey, VariantKey};

/// Extensions accepted for target and reference uploads
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "aiff", "m4a", "ogg"];

/// Reduce an uploaded file name to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    // Browsers may send a full client-side path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether the file name carries one of [`ALLOWED_EXTENSIONS`]
pub fn has_allowed_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct StorageLayout {
    folders: DataFolders,
}

impl StorageLayout {
    pub fn new(folders: DataFolders) -> Self {
        Self { folders }
    }

    pub fn upload_dir(&self, job_id: Uuid) -> PathBuf {
        self.folders.uploads.join(job_id.to_string())
    }

    pub fn target_upload_path(&self, job_id: Uuid, original_name: &str) -> PathBuf {
        self.upload_dir(job_id).join(sanitize_filename(original_name))
    }

    pub fn reference_upload_path(&self, job_id: Uuid, reference_index: usize, original_name: &str) -> PathBuf {
        self.upload_dir(job_id).join(format!(
            "reference_{}_{}",
            reference_index,
            sanitize_filename(original_name)
        ))
    }

    pub fn results_dir(&self, job_id: Uuid) -> PathBuf {
        self.folders.results.join(job_id.to_string())
    }

    pub fn result_path(&self, job_id: Uuid, reference_index: usize, format: DownloadFormat) -> PathBuf {
        let name = match format {
            DownloadFormat::Wav16 => format!("mastered_{}_16bit.wav", reference_index),
            DownloadFormat::Wav24 => format!("mastered_{}_24bit.wav", reference_index),
            DownloadFormat::Wav24Low => format!("mastered_{}_low_24bit.wav", reference_index),
            DownloadFormat::Wav24High => format!("mastered_{}_high_24bit.wav", reference_index),
            DownloadFormat::Wav24Nolimiter => format!("mastered_{}_24bit_nolimiter.wav", reference_index),
            DownloadFormat::Wav24NolimiterNormalized => {
                format!("mastered_{}_24bit_nolimiter_normalized.wav", reference_index)
            }
        };
        self.results_dir(job_id).join(name)
    }

    pub fn previews_dir(&self, job_id: Uuid) -> PathBuf {
        self.folders.previews.join(job_id.to_string())
    }

    pub fn preview_path(&self, job_id: Uuid, reference_index: usize, key: PreviewKey) -> PathBuf {
        let name = match key {
            PreviewKey::Original => format!("preview_{}_original.wav", reference_index),
            PreviewKey::Variant(VariantKey::Limited) => format!("preview_{}.wav", reference_index),
            PreviewKey::Variant(variant) => format!("preview_{}_{}.wav", reference_index, variant),
        };
        self.previews_dir(job_id).join(name)
    }
}
