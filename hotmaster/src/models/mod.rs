//! Data models shared by the services and the HTTP API

pub mod candidate;
pub mod job;
pub mod variant;

pub use candidate::{candidate_id, Candidate, Comparison};
pub use job::{Job, JobStatus, ReferenceError, ReferenceOutcome, ReferenceResult};
pub use variant::{BitDepth, DownloadFormat, PreviewKey, VariantKey};
