//! Voting candidates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candidate identifier for reference `reference_index` of a job
pub fn candidate_id(job_id: Uuid, reference_index: usize) -> String {
    format!("{}_ref_{}", job_id, reference_index)
}

/// One successfully mastered reference, eligible for comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub reference_index: usize,
    /// Times this candidate was voted the better one
    pub votes: u32,
    pub wins: u32,
    pub losses: u32,
}

impl Candidate {
    pub fn new(job_id: Uuid, reference_index: usize) -> Self {
        Self {
            id: candidate_id(job_id, reference_index),
            reference_index,
            votes: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// How often this candidate has been compared, as used by pair selection
    pub fn exposure(&self) -> u32 {
        self.votes + self.wins + self.losses
    }
}

/// Two candidates offered to the client for comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub candidate_a: Candidate,
    pub candidate_b: Candidate,
}

impl Comparison {
    /// Same two candidates, in either order
    pub fn same_pair(&self, a: &str, b: &str) -> bool {
        (self.candidate_a.id == a && self.candidate_b.id == b)
            || (self.candidate_a.id == b && self.candidate_b.id == a)
    }
}
