use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::aggregation::blend;

/// Reserved score for a characterization with no numeric rating.
pub const QUALITATIVE_ONLY_SCORE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub i64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Evidence channel. Also used as the kind of a [`SkillRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Hard,
    Soft,
    Test,
    Feedback,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Hard,
        Channel::Soft,
        Channel::Test,
        Channel::Feedback,
    ];
}

/// How the display justification of a channel total is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Justification {
    /// Point-in-time narrative from a collaborator; replaced wholesale on update.
    Narrative(String),
    /// Ordered set of contributing source titles (survey names).
    Sources(Vec<String>),
    /// Fixed wording that never changes between updates.
    Fixed(String),
}

impl Justification {
    pub fn sources<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut justification = Justification::Sources(Vec::new());
        justification.extend_sources(titles);
        justification
    }

    /// Union the titles into the source set, keeping first-seen order.
    ///
    /// No-op for narrative and fixed justifications.
    pub fn extend_sources<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Justification::Sources(existing) = self else {
            return;
        };

        for title in titles {
            let title = title.as_ref().trim();
            if title.is_empty() || existing.iter().any(|t| t == title) {
                continue;
            }
            existing.push(title.to_string());
        }
    }

    pub fn render(&self) -> String {
        match self {
            Justification::Narrative(text) | Justification::Fixed(text) => text.clone(),
            Justification::Sources(titles) => format!("Survey results: {}", titles.join(", ")),
        }
    }
}

/// Running summary of one channel for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTotal {
    pub score: f64,
    pub justification: Justification,
    pub updated_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl ChannelTotal {
    pub fn new(score: f64, justification: Justification) -> Self {
        Self {
            score,
            justification,
            updated_count: 1,
            updated_at: Utc::now(),
        }
    }

    /// Replace score and justification (last write wins).
    pub fn overwrite(&mut self, score: f64, justification: Justification) {
        self.score = score;
        self.justification = justification;
        self.touch();
    }

    /// Fold a new observation into the running score.
    pub fn blend_in(&mut self, incoming: f64) {
        self.score = blend(self.score, incoming);
        self.touch();
    }

    pub fn justification_text(&self) -> String {
        self.justification.render()
    }

    fn touch(&mut self) {
        self.updated_count += 1;
        self.updated_at = Utc::now();
    }
}

/// The four optional per-candidate channel totals. A missing slot means the channel has
/// not reported yet and counts as 0 in composite scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSlots {
    pub hard: Option<ChannelTotal>,
    pub soft: Option<ChannelTotal>,
    pub test: Option<ChannelTotal>,
    pub feedback: Option<ChannelTotal>,
}

impl ChannelSlots {
    pub fn get(&self, channel: Channel) -> Option<&ChannelTotal> {
        match channel {
            Channel::Hard => self.hard.as_ref(),
            Channel::Soft => self.soft.as_ref(),
            Channel::Test => self.test.as_ref(),
            Channel::Feedback => self.feedback.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, channel: Channel) -> &mut Option<ChannelTotal> {
        match channel {
            Channel::Hard => &mut self.hard,
            Channel::Soft => &mut self.soft,
            Channel::Test => &mut self.test,
            Channel::Feedback => &mut self.feedback,
        }
    }

    pub fn score_or_zero(&self, channel: Channel) -> f64 {
        self.get(channel).map(|t| t.score).unwrap_or(0.0)
    }

    pub fn composite_score(&self) -> f64 {
        Channel::ALL.iter().map(|c| self.score_or_zero(*c)).sum()
    }

    pub fn reported(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL.into_iter().filter(|c| self.get(*c).is_some())
    }
}

/// One piece of itemized skill evidence. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub title: String,
    pub score: f64,
    pub kind: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl SkillRecord {
    pub fn scored(
        title: impl Into<String>,
        score: f64,
        kind: Channel,
        justification: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            score,
            kind,
            justification,
        }
    }

    /// Former-employer characterization without a numeric rating.
    pub fn qualitative(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            score: QUALITATIVE_ONLY_SCORE,
            kind: Channel::Feedback,
            justification: Some("former-employer qualitative note".into()),
        }
    }

    /// Only FEEDBACK records carry the sentinel meaning.
    pub fn is_qualitative_only(&self) -> bool {
        self.kind == Channel::Feedback && self.score == QUALITATIVE_ONLY_SCORE
    }

    /// Score usable in averages; `None` for the qualitative-only sentinel.
    pub fn numeric_score(&self) -> Option<f64> {
        (!self.is_qualitative_only()).then_some(self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub full_name: String,
    #[serde(default)]
    pub channels: ChannelSlots,
    #[serde(default)]
    pub skills: Vec<SkillRecord>,
}

impl Candidate {
    pub fn new(id: i64, full_name: impl Into<String>) -> Self {
        Self {
            id: CandidateId(id),
            full_name: full_name.into(),
            channels: ChannelSlots::default(),
            skills: Vec::new(),
        }
    }

    pub fn composite_score(&self) -> f64 {
        self.channels.composite_score()
    }

    pub fn skills_of(&self, kind: Channel) -> impl Iterator<Item = &SkillRecord> + '_ {
        self.skills.iter().filter(move |s| s.kind == kind)
    }

    /// Titles of qualitative-only characterizations, in arrival order.
    pub fn characterizations(&self) -> Vec<String> {
        self.skills
            .iter()
            .filter(|s| s.is_qualitative_only())
            .map(|s| s.title.clone())
            .collect()
    }
}
