use serde::Serialize;

use crate::candidate::{Candidate, CandidateId, Channel};

pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: Channel,
    pub score: Option<f64>,
    pub justification: String,
    pub updated_count: u32,
}

/// Mean of the numeric skill records of one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillAverage {
    pub kind: Channel,
    pub mean: f64,
    pub count: usize,
}

/// Read-side view of one candidate, ready to hand to a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub channels: Vec<ChannelSummary>,
    pub composite_score: f64,
    pub skill_averages: Vec<SkillAverage>,
    /// Employer characterizations that came without a numeric score.
    pub characterizations: Vec<String>,
}

impl CandidateReport {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let channels = Channel::ALL
            .iter()
            .map(|channel| match candidate.channels.get(*channel) {
                Some(total) => ChannelSummary {
                    channel: *channel,
                    score: Some(total.score),
                    justification: total.justification_text(),
                    updated_count: total.updated_count,
                },
                None => ChannelSummary {
                    channel: *channel,
                    score: None,
                    justification: NO_DATA.to_string(),
                    updated_count: 0,
                },
            })
            .collect();

        let skill_averages = Channel::ALL
            .iter()
            .filter_map(|kind| {
                let scores: Vec<f64> = candidate
                    .skills_of(*kind)
                    .filter_map(|record| record.numeric_score())
                    .collect();
                if scores.is_empty() {
                    return None;
                }
                Some(SkillAverage {
                    kind: *kind,
                    mean: scores.iter().sum::<f64>() / scores.len() as f64,
                    count: scores.len(),
                })
            })
            .collect();

        Self {
            candidate_id: candidate.id,
            full_name: candidate.full_name.clone(),
            channels,
            composite_score: candidate.composite_score(),
            skill_averages,
            characterizations: candidate.characterizations(),
        }
    }
}
