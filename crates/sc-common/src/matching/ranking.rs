use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::skills::SkillMatcher;
use crate::{Candidate, CandidateId, JobOpening};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub score: f64,
}

impl RankedCandidate {
    fn new(candidate: &Candidate, score: f64) -> Self {
        Self {
            candidate_id: candidate.id,
            full_name: candidate.full_name.clone(),
            score,
        }
    }
}

/// Highest first. `sort_by` is stable, so ties keep input order.
fn sort_descending(ranked: &mut [RankedCandidate]) {
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[derive(Debug, Clone, Default)]
pub struct CandidateRanker {
    matcher: SkillMatcher,
}

impl CandidateRanker {
    pub fn new(matcher: SkillMatcher) -> Self {
        Self { matcher }
    }

    /// Sum of the four channel totals, 0 for channels that never reported.
    pub fn rank_by_composite(&self, candidates: &[Candidate]) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = candidates
            .iter()
            .map(|c| RankedCandidate::new(c, c.composite_score()))
            .collect();

        sort_descending(&mut ranked);
        ranked
    }

    /// Order candidates by their skill match against the job.
    pub fn rank_by_skill_match(
        &self,
        job: &JobOpening,
        candidates: &[Candidate],
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = candidates
            .iter()
            .map(|c| {
                let score = self
                    .matcher
                    .score_candidate_against_job(&c.skills, &job.required_skills);
                RankedCandidate::new(c, score)
            })
            .collect();

        sort_descending(&mut ranked);
        debug!(
            job_id = job.id,
            candidates = ranked.len(),
            threshold = self.matcher.threshold(),
            "ranked candidates by skill match"
        );
        ranked
    }
}
