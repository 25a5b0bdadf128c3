use super::{Evidence, Rubric, ScoringOracle};
use crate::error::OracleError;
use crate::payload::{ChannelScore, SkillItem};
use crate::skill_normalizer::normalize_skill;

/// Mentions needed for a skill to reach 100.
pub const SATURATION_MENTIONS: usize = 4;

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ',' | ';' | ':' | '(' | ')' | '[' | ']' | '/' | '!' | '?' | '"' | '\'' | '|'
        )
}

/// Normalized word tokens. Inner dots survive ("node.js"), trailing ones do not.
fn tokenize(text: &str) -> Vec<String> {
    normalize_skill(text)
        .split(is_separator)
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn count_mentions(haystack: &[String], needle: &[String]) -> usize {
    if needle.is_empty() || needle.len() > haystack.len() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Deterministic stand-in for the LLM collaborator.
///
/// Each required skill scores 25 per whole-word mention in the evidence, capped at 100;
/// the total is the mean over all required skills, unmentioned ones counting 0.
#[derive(Debug, Clone, Default)]
pub struct KeywordOracle;

impl KeywordOracle {
    /// `(skill, mentions)` for every non-blank skill of the rubric.
    fn mentions(
        &self,
        evidence: &Evidence,
        rubric: &Rubric,
    ) -> Result<Vec<(String, usize)>, OracleError> {
        if evidence.is_blank() {
            return Err(OracleError::EmptyEvidence(rubric.channel.to_string()));
        }

        let haystack = tokenize(&evidence.text);
        Ok(rubric
            .required_skills
            .iter()
            .filter_map(|skill| {
                let needle = tokenize(skill);
                if needle.is_empty() {
                    return None;
                }
                Some((skill.trim().to_string(), count_mentions(&haystack, &needle)))
            })
            .collect())
    }
}

fn level(mentions: usize) -> f64 {
    mentions.min(SATURATION_MENTIONS) as f64 / SATURATION_MENTIONS as f64 * 100.0
}

impl ScoringOracle for KeywordOracle {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn evaluate(&self, evidence: &Evidence, rubric: &Rubric) -> Result<ChannelScore, OracleError> {
        let levels = self.mentions(evidence, rubric)?;
        if levels.is_empty() {
            return Ok(ChannelScore {
                total: 0.0,
                justification: format!("No skills to evaluate for {}.", rubric.job_title),
            });
        }

        let found: Vec<&str> = levels
            .iter()
            .filter(|(_, mentions)| *mentions > 0)
            .map(|(title, _)| title.as_str())
            .collect();
        let total = levels.iter().map(|(_, m)| level(*m)).sum::<f64>() / levels.len() as f64;

        let justification = if found.is_empty() {
            format!(
                "None of the {} evaluated skills were found for {}.",
                levels.len(),
                rubric.job_title
            )
        } else {
            format!(
                "Found {} of {} evaluated skills for {}: {}.",
                found.len(),
                levels.len(),
                rubric.job_title,
                found.join(", ")
            )
        };

        Ok(ChannelScore {
            total,
            justification,
        })
    }

    /// Only mentioned skills are itemized.
    fn itemize(&self, evidence: &Evidence, rubric: &Rubric) -> Result<Vec<SkillItem>, OracleError> {
        Ok(self
            .mentions(evidence, rubric)?
            .into_iter()
            .filter(|(_, mentions)| *mentions > 0)
            .map(|(title, mentions)| SkillItem {
                title,
                score: level(mentions),
                justification: Some(format!("{mentions} mention(s)")),
            })
            .collect())
    }
}
