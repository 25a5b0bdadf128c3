use super::{Evidence, Rubric, ScoringOracle};
use crate::candidate::Channel;
use crate::error::OracleError;
use crate::payload::{ChannelScore, SkillItem};

/// Returns the same score for every request; optionally unavailable for one channel.
#[derive(Debug, Clone)]
pub struct FixedOracle {
    score: ChannelScore,
    items: Vec<SkillItem>,
    unavailable_for: Option<Channel>,
}

impl FixedOracle {
    pub fn new(total: f64, justification: impl Into<String>) -> Self {
        Self {
            score: ChannelScore {
                total,
                justification: justification.into(),
            },
            items: Vec::new(),
            unavailable_for: None,
        }
    }

    pub fn with_items(mut self, items: Vec<SkillItem>) -> Self {
        self.items = items;
        self
    }

    pub fn unavailable_for(mut self, channel: Channel) -> Self {
        self.unavailable_for = Some(channel);
        self
    }

    fn check(&self, rubric: &Rubric) -> Result<(), OracleError> {
        if self.unavailable_for == Some(rubric.channel) {
            return Err(OracleError::Unavailable(format!(
                "fixed oracle disabled for {}",
                rubric.channel
            )));
        }
        Ok(())
    }
}

impl ScoringOracle for FixedOracle {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn evaluate(&self, _evidence: &Evidence, rubric: &Rubric) -> Result<ChannelScore, OracleError> {
        self.check(rubric)?;
        Ok(self.score.clone())
    }

    fn itemize(&self, _evidence: &Evidence, rubric: &Rubric) -> Result<Vec<SkillItem>, OracleError> {
        self.check(rubric)?;
        Ok(self.items.clone())
    }
}
