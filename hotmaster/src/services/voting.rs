//! Pairwise comparison and ranking
//!
//! Each job owns a ballot: one candidate per successfully mastered reference
//! plus the most recent comparison offered. Pair selection favours the least
//! compared candidates and never offers the previous pair again when a
//! different one exists.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::{candidate_id, Candidate, Comparison};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VotingError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("At least two mastered references are needed for a comparison")]
    NotEnoughCandidates,

    /// Two distinct candidates with different references could not be found
    #[error("Could not select two candidates with different references")]
    DuplicateReference,
}

#[derive(Debug, Default)]
struct Ballot {
    /// Registration order
    candidates: Vec<Candidate>,
    last_comparison: Option<(String, String)>,
}

impl Ballot {
    fn was_last_offered(&self, id: &str) -> bool {
        self.last_comparison
            .as_ref()
            .map(|(a, b)| a == id || b == id)
            .unwrap_or(false)
    }

    fn is_last_pair(&self, a: &str, b: &str) -> bool {
        self.last_comparison
            .as_ref()
            .map(|(x, y)| (x == a && y == b) || (x == b && y == a))
            .unwrap_or(false)
    }

    /// Stable sort of the registration order, descending by (wins, votes)
    fn ranking(&self) -> Vec<Candidate> {
        let mut ranking = self.candidates.clone();
        ranking.sort_by(|a, b| (b.wins, b.votes).cmp(&(a.wins, a.votes)));
        ranking
    }
}

struct VotingState {
    ballots: HashMap<Uuid, Ballot>,
    rng: StdRng,
}

/// Current ranking plus the same candidates keyed by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub rankings: Vec<Candidate>,
    pub candidates_by_id: BTreeMap<String, Candidate>,
}

/// Shared voting state for every job
#[derive(Clone)]
pub struct VotingEngine {
    state: Arc<Mutex<VotingState>>,
}

impl Default for VotingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VotingEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic pair selection for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(VotingState {
                ballots: HashMap::new(),
                rng,
            })),
        }
    }

    /// Open an empty ballot for a freshly submitted job
    pub async fn create_job(&self, job_id: Uuid) {
        let mut state = self.state.lock().await;
        state.ballots.entry(job_id).or_default();
    }

    /// Add the candidate for a successfully processed reference.
    /// Registering the same reference twice has no effect.
    pub async fn register(&self, job_id: Uuid, reference_index: usize) {
        let mut state = self.state.lock().await;
        let ballot = state.ballots.entry(job_id).or_default();

        let id = candidate_id(job_id, reference_index);
        if ballot.candidates.iter().any(|c| c.id == id) {
            return;
        }
        ballot.candidates.push(Candidate::new(job_id, reference_index));
        debug!(job_id = %job_id, reference_index, "Registered voting candidate");
    }

    /// Select the next two candidates to compare
    pub async fn next_pair(&self, job_id: Uuid) -> Result<Comparison, VotingError> {
        let mut guard = self.state.lock().await;
        let VotingState { ballots, rng } = &mut *guard;
        let ballot = ballots.get_mut(&job_id).ok_or(VotingError::JobNotFound(job_id))?;

        if ballot.candidates.len() < 2 {
            return Err(VotingError::NotEnoughCandidates);
        }

        let fresh: Vec<&Candidate> = ballot
            .candidates
            .iter()
            .filter(|c| !ballot.was_last_offered(&c.id))
            .collect();
        let mut eligible: Vec<&Candidate> = if fresh.len() >= 2 {
            fresh
        } else {
            ballot.candidates.iter().collect()
        };

        // Stable: equally exposed candidates keep registration order
        eligible.sort_by_key(|c| c.exposure());

        let pool_size = (eligible.len() / 2).max(2);
        let mut picked = eligible[..pool_size].choose_multiple(rng, 2);
        let (mut first, mut second) = match (picked.next(), picked.next()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => return Err(VotingError::NotEnoughCandidates),
        };

        if first.id == second.id {
            if let Some(other) = pick_where(&eligible, rng, |c| c.id != first.id) {
                second = other;
            }
        }

        if first.reference_index == second.reference_index {
            second = pick_where(&eligible, rng, |c| c.reference_index != first.reference_index)
                .ok_or(VotingError::DuplicateReference)?;
        }

        // Only reachable with exactly three candidates, where the filtered
        // set fell back to everyone
        if ballot.is_last_pair(&first.id, &second.id) {
            let outsider = ballot
                .candidates
                .iter()
                .filter(|c| !ballot.was_last_offered(&c.id))
                .filter(|c| c.reference_index != first.reference_index)
                .collect::<Vec<_>>()
                .choose(rng)
                .copied();
            if let Some(outsider) = outsider {
                second = outsider;
            }
        }

        if rng.gen_bool(0.5) {
            std::mem::swap(&mut first, &mut second);
        }

        let comparison = Comparison {
            candidate_a: first.clone(),
            candidate_b: second.clone(),
        };
        ballot.last_comparison = Some((comparison.candidate_a.id.clone(), comparison.candidate_b.id.clone()));

        debug!(
            job_id = %job_id,
            candidate_a = %comparison.candidate_a.id,
            candidate_b = %comparison.candidate_b.id,
            "Selected comparison"
        );
        Ok(comparison)
    }

    /// Count a vote and return the updated ranking.
    ///
    /// The winner gains a vote and a win, the loser only a loss. Ids that do
    /// not belong to the job are ignored.
    pub async fn record_vote(&self, job_id: Uuid, winner_id: &str, loser_id: &str) -> Result<Vec<Candidate>, VotingError> {
        let mut state = self.state.lock().await;
        let ballot = state.ballots.get_mut(&job_id).ok_or(VotingError::JobNotFound(job_id))?;

        if let Some(winner) = ballot.candidates.iter_mut().find(|c| c.id == winner_id) {
            winner.votes += 1;
            winner.wins += 1;
        }
        if let Some(loser) = ballot.candidates.iter_mut().find(|c| c.id == loser_id) {
            loser.losses += 1;
        }

        debug!(job_id = %job_id, winner_id, loser_id, "Recorded vote");
        Ok(ballot.ranking())
    }

    /// Candidates sorted by wins, then votes
    pub async fn ranking(&self, job_id: Uuid) -> Result<Vec<Candidate>, VotingError> {
        let state = self.state.lock().await;
        let ballot = state.ballots.get(&job_id).ok_or(VotingError::JobNotFound(job_id))?;
        Ok(ballot.ranking())
    }

    pub async fn standings(&self, job_id: Uuid) -> Result<Standings, VotingError> {
        let rankings = self.ranking(job_id).await?;
        let candidates_by_id = rankings.iter().map(|c| (c.id.clone(), c.clone())).collect();
        Ok(Standings {
            rankings,
            candidates_by_id,
        })
    }
}

fn pick_where<'a>(
    candidates: &[&'a Candidate],
    rng: &mut StdRng,
    keep: impl Fn(&Candidate) -> bool,
) -> Option<&'a Candidate> {
    let matching: Vec<&'a Candidate> = candidates.iter().copied().filter(|c| keep(c)).collect();
    matching.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn engine_with(count: usize, seed: u64) -> (VotingEngine, Uuid) {
        let engine = VotingEngine::with_seed(seed);
        let job_id = Uuid::new_v4();
        engine.create_job(job_id).await;
        for idx in 1..=count {
            engine.register(job_id, idx).await;
        }
        (engine, job_id)
    }

    fn assert_sorted(ranking: &[Candidate]) {
        for pair in ranking.windows(2) {
            assert!((pair[0].wins, pair[0].votes) >= (pair[1].wins, pair[1].votes));
        }
        for candidate in ranking {
            assert!(candidate.wins <= candidate.votes);
        }
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let engine = VotingEngine::with_seed(1);
        let job_id = Uuid::new_v4();
        assert_eq!(engine.next_pair(job_id).await.unwrap_err(), VotingError::JobNotFound(job_id));
        assert!(engine.record_vote(job_id, "a", "b").await.is_err());
        assert!(engine.ranking(job_id).await.is_err());
    }

    #[tokio::test]
    async fn test_needs_two_candidates() {
        let (engine, job_id) = engine_with(1, 1).await;
        assert_eq!(engine.next_pair(job_id).await.unwrap_err(), VotingError::NotEnoughCandidates);

        let (engine, job_id) = engine_with(0, 1).await;
        assert_eq!(engine.next_pair(job_id).await.unwrap_err(), VotingError::NotEnoughCandidates);
        assert!(engine.ranking(job_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (engine, job_id) = engine_with(2, 1).await;
        engine.register(job_id, 2).await;
        assert_eq!(engine.ranking(job_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pairs_are_distinct() {
        for count in 2..=10 {
            for seed in 0..20 {
                let (engine, job_id) = engine_with(count, seed).await;
                for _ in 0..15 {
                    let pair = engine.next_pair(job_id).await.unwrap();
                    assert_ne!(pair.candidate_a.id, pair.candidate_b.id);
                    assert_ne!(pair.candidate_a.reference_index, pair.candidate_b.reference_index);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_no_immediate_repeat_above_two_candidates() {
        for count in 3..=10 {
            for seed in 0..20 {
                let (engine, job_id) = engine_with(count, seed).await;
                let mut previous = engine.next_pair(job_id).await.unwrap();
                for round in 0..20 {
                    let next = engine.next_pair(job_id).await.unwrap();
                    assert!(
                        !previous.same_pair(&next.candidate_a.id, &next.candidate_b.id),
                        "repeat with {} candidates, seed {}",
                        count,
                        seed
                    );
                    // Vote now and then so exposure shifts the pool
                    if round % 3 == 0 {
                        engine
                            .record_vote(job_id, &next.candidate_a.id, &next.candidate_b.id)
                            .await
                            .unwrap();
                    }
                    previous = next;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_two_candidates_repeat_is_allowed() {
        let (engine, job_id) = engine_with(2, 7).await;
        let first = engine.next_pair(job_id).await.unwrap();
        let second = engine.next_pair(job_id).await.unwrap();
        assert!(first.same_pair(&second.candidate_a.id, &second.candidate_b.id));
    }

    #[tokio::test]
    async fn test_first_pair_drawn_from_least_compared_half() {
        let (engine, job_id) = engine_with(4, 3).await;
        let c1 = candidate_id(job_id, 1);
        let c2 = candidate_id(job_id, 2);
        let c3 = candidate_id(job_id, 3);
        let c4 = candidate_id(job_id, 4);
        engine.record_vote(job_id, &c1, &c2).await.unwrap();
        engine.record_vote(job_id, &c1, &c2).await.unwrap();

        let pair = engine.next_pair(job_id).await.unwrap();
        assert!(pair.same_pair(&c3, &c4));
    }

    #[tokio::test]
    async fn test_vote_updates_counts_and_ranking() {
        let (engine, job_id) = engine_with(3, 11).await;
        let a = candidate_id(job_id, 2);
        let b = candidate_id(job_id, 1);

        let ranking = engine.record_vote(job_id, &a, &b).await.unwrap();
        assert_sorted(&ranking);

        let winner = ranking.iter().find(|c| c.id == a).unwrap();
        assert_eq!((winner.votes, winner.wins, winner.losses), (1, 1, 0));
        let loser = ranking.iter().find(|c| c.id == b).unwrap();
        assert_eq!((loser.votes, loser.wins, loser.losses), (0, 0, 1));

        // Winner first, then the two zero-win candidates in registration order
        let order: Vec<usize> = ranking.iter().map(|c| c.reference_index).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_ties_follow_registration_order() {
        let (engine, job_id) = engine_with(3, 13).await;
        let c1 = candidate_id(job_id, 1);
        let c2 = candidate_id(job_id, 2);
        let c3 = candidate_id(job_id, 3);

        let ranking = engine.record_vote(job_id, &c2, &c3).await.unwrap();
        let order: Vec<usize> = ranking.iter().map(|c| c.reference_index).collect();
        assert_eq!(order, vec![2, 1, 3]);

        // 1 and 2 now tie at one win and one vote; 2 led before but 1 registered first
        let ranking = engine.record_vote(job_id, &c1, &c3).await.unwrap();
        let order: Vec<usize> = ranking.iter().map(|c| c.reference_index).collect();
        assert_eq!(order, vec![1, 2, 3]);

        let order: Vec<usize> = engine
            .ranking(job_id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.reference_index)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_candidates_are_ignored() {
        let (engine, job_id) = engine_with(2, 5).await;
        let ranking = engine.record_vote(job_id, "nobody", "nobody_else").await.unwrap();
        assert!(ranking.iter().all(|c| c.exposure() == 0));

        let winner = candidate_id(job_id, 1);
        let ranking = engine.record_vote(job_id, &winner, "nobody").await.unwrap();
        assert_eq!(ranking[0].id, winner);
        assert_eq!(ranking[1].losses, 0);
    }

    #[tokio::test]
    async fn test_ranking_stays_sorted_over_many_votes() {
        let (engine, job_id) = engine_with(6, 42).await;
        for _ in 0..50 {
            let pair = engine.next_pair(job_id).await.unwrap();
            let ranking = engine
                .record_vote(job_id, &pair.candidate_a.id, &pair.candidate_b.id)
                .await
                .unwrap();
            assert_sorted(&ranking);
        }

        let standings = engine.standings(job_id).await.unwrap();
        assert_eq!(standings.rankings.len(), 6);
        assert_eq!(standings.candidates_by_id.len(), 6);
        assert_sorted(&standings.rankings);
    }

    #[tokio::test]
    async fn test_seeded_selection_is_reproducible() {
        let (first_engine, first_job) = engine_with(5, 99).await;
        let (second_engine, second_job) = engine_with(5, 99).await;

        for _ in 0..10 {
            let a = first_engine.next_pair(first_job).await.unwrap();
            let b = second_engine.next_pair(second_job).await.unwrap();
            assert_eq!(a.candidate_a.reference_index, b.candidate_a.reference_index);
            assert_eq!(a.candidate_b.reference_index, b.candidate_b.reference_index);
        }
    }
}
