pub mod ranking;
pub mod similarity;
pub mod skills;

pub use ranking::{CandidateRanker, RankedCandidate};
pub use similarity::sequence_ratio;
pub use skills::{
    DEFAULT_SKILL_MATCH_THRESHOLD, MatchedSkill, SkillMatchBreakdown, SkillMatcher, skills_match,
};
