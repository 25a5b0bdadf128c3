pub mod aggregation;
pub mod candidate;
pub mod config;
pub mod error;
pub mod logging;
pub mod matching;
pub mod oracle;
pub mod payload;
pub mod pipeline;
pub mod report;
pub mod skill_normalizer;
pub mod store;

use serde::{Deserialize, Serialize};

pub use candidate::{Candidate, CandidateId, Channel, ChannelSlots, ChannelTotal, SkillRecord};

// Job-side data shared by the matcher and ranker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOpening {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub required_skills: Vec<RequiredSkill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSkill {
    pub title: String,
}

impl RequiredSkill {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl JobOpening {
    pub fn new<I, S>(id: i64, title: impl Into<String>, required_skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            title: title.into(),
            required_skills: required_skills.into_iter().map(RequiredSkill::new).collect(),
        }
    }

    pub fn required_titles(&self) -> Vec<String> {
        self.required_skills.iter().map(|s| s.title.clone()).collect()
    }
}
