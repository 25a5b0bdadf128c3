pub mod fixed;
pub mod keyword;

pub use fixed::FixedOracle;
pub use keyword::KeywordOracle;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::candidate::Channel;
use crate::error::OracleError;
use crate::payload::{ChannelScore, SkillItem};
use crate::JobOpening;

pub const DEFAULT_ORACLE: &str = "keyword";

/// Soft skills the social channel is judged on when the opening names none of its own.
pub const DEFAULT_SOFT_SKILLS: [&str; 6] = [
    "Communication",
    "Teamwork",
    "Responsibility",
    "Stress resistance",
    "Leadership",
    "Persuasion",
];

/// Raw text the oracle judges: resume body or collected social posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub text: String,
}

impl Evidence {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What the oracle is asked to score and against which skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub channel: Channel,
    pub job_title: String,
    pub required_skills: Vec<String>,
    pub guidance: String,
}

impl Rubric {
    pub fn for_resume(job: &JobOpening) -> Self {
        Self {
            channel: Channel::Hard,
            job_title: job.title.clone(),
            required_skills: job.required_titles(),
            guidance: "Score only the required hard skills evidenced in the resume, 0-100 each; \
                       the total is the mean over the required skills."
                .into(),
        }
    }

    pub fn for_social(job: &JobOpening) -> Self {
        Self {
            channel: Channel::Soft,
            job_title: job.title.clone(),
            required_skills: DEFAULT_SOFT_SKILLS.iter().map(|s| s.to_string()).collect(),
            guidance: "Score soft skills relevant to the role from public posts, 0-100 each."
                .into(),
        }
    }
}

/// Seam for the external scorer (an LLM in production).
///
/// Implementations:
/// - KeywordOracle: deterministic keyword-frequency scoring, usable offline
/// - FixedOracle: returns fixed values for tests
pub trait ScoringOracle: Send + Sync {
    /// Implementation name ("keyword", "fixed").
    fn name(&self) -> &'static str;

    /// Channel total and justification for the evidence.
    fn evaluate(&self, evidence: &Evidence, rubric: &Rubric) -> Result<ChannelScore, OracleError>;

    /// Per-skill levels backing the total. Implementations without itemization return none.
    fn itemize(
        &self,
        _evidence: &Evidence,
        _rubric: &Rubric,
    ) -> Result<Vec<SkillItem>, OracleError> {
        Ok(Vec::new())
    }
}

/// Build an oracle by name; unknown names fall back to the default.
pub fn create_oracle(name: &str) -> Box<dyn ScoringOracle> {
    match name {
        "keyword" => Box::new(KeywordOracle::default()),
        other => {
            warn!(
                oracle = other,
                fallback = DEFAULT_ORACLE,
                "unknown scoring oracle; using fallback"
            );
            Box::new(KeywordOracle::default())
        }
    }
}
