use serde::Serialize;

use super::similarity::sequence_ratio;
use crate::candidate::SkillRecord;
use crate::skill_normalizer::{is_blank_skill, normalize_skill};
use crate::RequiredSkill;

pub const DEFAULT_SKILL_MATCH_THRESHOLD: f64 = 0.8;

/// Match on already-normalized titles: containment either way, or ratio >= threshold.
fn normalized_titles_match(candidate: &str, required: &str, threshold: f64) -> bool {
    candidate.contains(required)
        || required.contains(candidate)
        || sequence_ratio(candidate, required) >= threshold
}

/// Whether a candidate-claimed skill satisfies a required skill.
///
/// Blank titles normalize to "" and match everything; callers filter them first.
pub fn skills_match(candidate_title: &str, required_title: &str, threshold: f64) -> bool {
    normalized_titles_match(
        &normalize_skill(candidate_title),
        &normalize_skill(required_title),
        threshold,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSkill {
    pub required_title: String,
    pub candidate_title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatchBreakdown {
    /// Mean of matched candidate scores, 0 when nothing matched.
    pub score: f64,
    /// One entry per (required, candidate) match; a candidate skill may repeat.
    pub matches: Vec<MatchedSkill>,
    pub unmatched_required: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillMatcher {
    threshold: f64,
}

impl Default for SkillMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SKILL_MATCH_THRESHOLD)
    }
}

impl SkillMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Skill match score against the job requirements, in 0..=100.
    pub fn score_candidate_against_job(
        &self,
        candidate_skills: &[SkillRecord],
        required_skills: &[RequiredSkill],
    ) -> f64 {
        self.match_breakdown(candidate_skills, required_skills).score
    }

    /// Every required skill is compared with every usable candidate record and each match
    /// contributes the candidate score once, so a record matching two requirements counts
    /// twice. Blank titles and qualitative-only records never participate.
    pub fn match_breakdown(
        &self,
        candidate_skills: &[SkillRecord],
        required_skills: &[RequiredSkill],
    ) -> SkillMatchBreakdown {
        let usable: Vec<(String, &SkillRecord)> = candidate_skills
            .iter()
            .filter(|record| !record.is_qualitative_only() && !is_blank_skill(&record.title))
            .map(|record| (normalize_skill(&record.title), record))
            .collect();

        let mut matches = Vec::new();
        let mut unmatched_required = Vec::new();

        for required in required_skills.iter().filter(|r| !is_blank_skill(&r.title)) {
            let required_norm = normalize_skill(&required.title);

            let before = matches.len();
            for (candidate_norm, record) in &usable {
                if normalized_titles_match(candidate_norm, &required_norm, self.threshold) {
                    matches.push(MatchedSkill {
                        required_title: required.title.clone(),
                        candidate_title: record.title.clone(),
                        score: record.score,
                    });
                }
            }

            if matches.len() == before {
                unmatched_required.push(required.title.clone());
            }
        }

        let score = if matches.is_empty() {
            0.0
        } else {
            matches.iter().map(|m| m.score).sum::<f64>() / matches.len() as f64
        };

        SkillMatchBreakdown {
            score,
            matches,
            unmatched_required,
        }
    }
}
