//! Processing job record
//!
//! A job is one target mastered against N references. The record is created on
//! submission and afterwards mutated only by the task running that job.

use chrono::{DateTime, Utc};
use hotmaster_common::LimiterOverrides;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use super::variant::{DownloadFormat, PreviewKey};

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// References are still being processed
    Processing,
    /// Every reference has been attempted
    Completed,
}

/// Successful processing of one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceResult {
    pub success: bool,
    pub reference_index: usize,
    /// Mastered files, keyed by download format
    pub outputs: BTreeMap<DownloadFormat, PathBuf>,
    /// Preview clips actually written (may be empty)
    pub previews: BTreeMap<PreviewKey, PathBuf>,
}

impl ReferenceResult {
    pub fn new(
        reference_index: usize,
        outputs: BTreeMap<DownloadFormat, PathBuf>,
        previews: BTreeMap<PreviewKey, PathBuf>,
    ) -> Self {
        Self {
            success: true,
            reference_index,
            outputs,
            previews,
        }
    }
}

/// Failed processing of one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceError {
    pub success: bool,
    pub reference_index: usize,
    pub error: String,
}

impl ReferenceError {
    pub fn new(reference_index: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            reference_index,
            error: error.into(),
        }
    }
}

/// Outcome of one reference, appended to the job when it is known
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceOutcome {
    Success(ReferenceResult),
    Failure(ReferenceError),
}

impl ReferenceOutcome {
    pub fn reference_index(&self) -> usize {
        match self {
            ReferenceOutcome::Success(result) => result.reference_index,
            ReferenceOutcome::Failure(error) => error.reference_index,
        }
    }
}

/// In-memory job record
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub completed: usize,
    pub results: Vec<ReferenceResult>,
    pub errors: Vec<ReferenceError>,
    pub target_path: PathBuf,
    pub limiter_settings: LimiterOverrides,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: Uuid, target_path: PathBuf, total: usize, limiter_settings: LimiterOverrides) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            total,
            completed: 0,
            results: Vec::new(),
            errors: Vec::new(),
            target_path,
            limiter_settings,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append an outcome and count the reference as done.
    ///
    /// `completed` never exceeds `total`; an outcome arriving after that is
    /// dropped and `false` is returned.
    pub fn record(&mut self, outcome: ReferenceOutcome) -> bool {
        if self.completed >= self.total {
            return false;
        }

        match outcome {
            ReferenceOutcome::Success(result) => self.results.push(result),
            ReferenceOutcome::Failure(error) => self.errors.push(error),
        }
        self.completed += 1;
        true
    }

    /// Transition to `Completed`. Returns `false` if the job already was.
    pub fn finish(&mut self) -> bool {
        if self.status == JobStatus::Completed {
            return false;
        }
        self.status = JobStatus::Completed;
        self.finished_at = Some(Utc::now());
        true
    }
}
