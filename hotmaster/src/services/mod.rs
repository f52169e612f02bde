//! Mastering, preview and voting services

pub mod job_orchestrator;
pub mod preview_extractor;
pub mod variant_pipeline;
pub mod voting;

pub use job_orchestrator::{JobOrchestrator, JobRequest, MAX_REFERENCES};
pub use preview_extractor::PreviewExtractor;
pub use variant_pipeline::{VariantOutputs, VariantPipeline, VARIANT_PLAN};
pub use voting::{Standings, VotingEngine, VotingError};
