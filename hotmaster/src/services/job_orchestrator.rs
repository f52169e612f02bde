//! Job Orchestrator
//!
//! Owns the job registry. Each submitted job gets one supervised background
//! task that masters its references one after another; cross-job work runs
//! concurrently. Results are appended under the registry write lock, and a
//! successful reference becomes a voting candidate right after.

use hotmaster_common::{Error, LimiterOverrides, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::preview_extractor::PreviewExtractor;
use super::variant_pipeline::VariantPipeline;
use super::voting::VotingEngine;
use crate::engine::EngineError;
use crate::models::{Job, ReferenceError, ReferenceOutcome, ReferenceResult};

/// Most references accepted for one job
pub const MAX_REFERENCES: usize = 10;

/// Files and settings for a new job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub target_path: PathBuf,
    /// Reference files; the first one is reference 1
    pub reference_paths: Vec<PathBuf>,
    pub overrides: LimiterOverrides,
}

impl JobRequest {
    pub fn validate(&self) -> Result<()> {
        if self.reference_paths.is_empty() {
            return Err(Error::InvalidInput(
                "At least one reference file is required".to_string(),
            ));
        }
        if self.reference_paths.len() > MAX_REFERENCES {
            return Err(Error::InvalidInput(format!(
                "At most {} reference files are allowed",
                MAX_REFERENCES
            )));
        }
        self.overrides.validate()
    }
}

#[derive(Clone)]
pub struct JobOrchestrator {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    voting: VotingEngine,
    pipeline: VariantPipeline,
    extractor: PreviewExtractor,
}

impl JobOrchestrator {
    pub fn new(voting: VotingEngine, pipeline: VariantPipeline, extractor: PreviewExtractor) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            voting,
            pipeline,
            extractor,
        }
    }

    /// Register a job under a fresh id and start processing it
    pub async fn submit(&self, request: JobRequest) -> Result<Uuid> {
        let job_id = Uuid::new_v4();
        self.submit_with_id(job_id, request).await?;
        Ok(job_id)
    }

    /// Register a job under an id chosen by the caller (uploads are stored
    /// under it before submission) and start processing it
    pub async fn submit_with_id(&self, job_id: Uuid, request: JobRequest) -> Result<()> {
        request.validate()?;

        {
            let mut jobs = self.jobs.write().await;
            if jobs.contains_key(&job_id) {
                return Err(Error::InvalidInput(format!("Job already exists: {}", job_id)));
            }
            jobs.insert(
                job_id,
                Job::new(
                    job_id,
                    request.target_path.clone(),
                    request.reference_paths.len(),
                    request.overrides,
                ),
            );
        }
        self.voting.create_job(job_id).await;

        info!(
            job_id = %job_id,
            references = request.reference_paths.len(),
            "Job submitted"
        );

        self.spawn_supervised(job_id, request);
        Ok(())
    }

    /// Snapshot of a job
    pub async fn status(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    fn spawn_supervised(&self, job_id: Uuid, request: JobRequest) {
        let worker = {
            let this = self.clone();
            tokio::spawn(async move { this.run_job(job_id, request).await })
        };

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!(job_id = %job_id, error = %e, "Job task ended abnormally");
            }
            this.finalize(job_id).await;
        });
    }

    async fn run_job(&self, job_id: Uuid, request: JobRequest) {
        for (position, reference_path) in request.reference_paths.iter().enumerate() {
            let reference_index = position + 1;
            info!(job_id = %job_id, reference_index, "Processing reference");

            let pipeline = self.pipeline.clone();
            let extractor = self.extractor.clone();
            let target = request.target_path.clone();
            let reference = reference_path.clone();
            let overrides = request.overrides;

            let handle = tokio::task::spawn_blocking(move || {
                let outputs = pipeline.run(job_id, reference_index, &target, &reference, &overrides)?;
                let previews = extractor.extract(job_id, reference_index, &target, &outputs.preview_sources())?;
                Ok::<_, EngineError>(ReferenceResult::new(reference_index, outputs.files, previews))
            });

            let outcome = match handle.await {
                Ok(Ok(result)) => ReferenceOutcome::Success(result),
                Ok(Err(e)) => {
                    error!(job_id = %job_id, reference_index, error = %e, "Reference failed");
                    ReferenceOutcome::Failure(ReferenceError::new(reference_index, e.to_string()))
                }
                Err(e) => {
                    error!(job_id = %job_id, reference_index, error = %e, "Reference task panicked");
                    ReferenceOutcome::Failure(ReferenceError::new(
                        reference_index,
                        format!("Processing task failed: {}", e),
                    ))
                }
            };

            self.record(job_id, outcome).await;
        }
    }

    async fn record(&self, job_id: Uuid, outcome: ReferenceOutcome) {
        let reference_index = outcome.reference_index();
        let success = matches!(outcome, ReferenceOutcome::Success(_));

        let recorded = match self.jobs.write().await.get_mut(&job_id) {
            Some(job) => job.record(outcome),
            None => false,
        };

        if recorded && success {
            self.voting.register(job_id, reference_index).await;
        }
    }

    /// Fill in any reference the worker never reached, then mark the job
    /// completed. Runs once per job, after the worker has stopped.
    async fn finalize(&self, job_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };

        let attempted: BTreeSet<usize> = job
            .results
            .iter()
            .map(|r| r.reference_index)
            .chain(job.errors.iter().map(|e| e.reference_index))
            .collect();
        for reference_index in 1..=job.total {
            if !attempted.contains(&reference_index) {
                warn!(job_id = %job_id, reference_index, "Reference was never processed");
                job.record(ReferenceOutcome::Failure(ReferenceError::new(
                    reference_index,
                    "Job stopped before this reference was processed",
                )));
            }
        }

        if job.finish() {
            info!(
                job_id = %job_id,
                succeeded = job.results.len(),
                failed = job.errors.len(),
                "Job completed"
            );
        }
    }
}
