use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};
use thiserror::Error;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 100.0;

/// Which collaborator produced a partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PayloadKind {
    /// Resume analysis (hard channel).
    Hard,
    /// Social-media analysis (soft channel).
    Soft,
    /// Survey/test and employer feedback submissions.
    #[serde(alias = "test", alias = "feedback")]
    Survey,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: PayloadKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind} payload: {field} must be {expected}, got {value}")]
    InvalidValue {
        kind: PayloadKind,
        field: String,
        expected: &'static str,
        value: f64,
    },
}

/// A single channel's `{total, justification}` pair as returned by a scoring oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelScore {
    #[serde(alias = "score")]
    pub total: f64,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub title: String,
    #[serde(alias = "level")]
    pub score: f64,
    #[serde(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardResult {
    #[serde(alias = "total")]
    pub score: f64,
    pub justification: String,
    #[serde(default, alias = "skills")]
    pub items: Vec<SkillItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftResult {
    #[serde(alias = "total")]
    pub score: f64,
    pub justification: String,
    #[serde(alias = "skills")]
    pub items: Vec<SkillItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedItem {
    pub title: String,
    #[serde(alias = "result")]
    pub raw_score: f64,
    #[serde(alias = "maximum")]
    pub max_score: f64,
    #[serde(alias = "is_optional", alias = "is_Optional")]
    pub is_feedback_item: bool,
}

impl HardResult {
    pub fn from_channel_score(score: ChannelScore, items: Vec<SkillItem>) -> Self {
        Self {
            score: score.total,
            justification: score.justification,
            items,
        }
    }
}

impl SoftResult {
    pub fn from_channel_score(score: ChannelScore, items: Vec<SkillItem>) -> Self {
        Self {
            score: score.total,
            justification: score.justification,
            items,
        }
    }
}

impl SubmittedItem {
    pub fn test(title: impl Into<String>, raw_score: f64, max_score: f64) -> Self {
        Self {
            title: title.into(),
            raw_score,
            max_score,
            is_feedback_item: false,
        }
    }

    pub fn feedback(title: impl Into<String>, raw_score: f64, max_score: f64) -> Self {
        Self {
            is_feedback_item: true,
            ..Self::test(title, raw_score, max_score)
        }
    }

    /// Feedback with neither a rating nor a scale: a narrative-only characterization.
    pub fn is_qualitative_only(&self) -> bool {
        self.is_feedback_item && self.raw_score == 0.0 && self.max_score == 0.0
    }
}

/// Typed partial result for one channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelPayload {
    Hard(HardResult),
    Soft(SoftResult),
    Survey(Vec<SubmittedItem>),
}

fn parse<T: DeserializeOwned>(kind: PayloadKind, value: Value) -> Result<T, PayloadError> {
    serde_json::from_value(value).map_err(|source| PayloadError::Malformed { kind, source })
}

fn ensure_finite(kind: PayloadKind, field: &str, value: f64) -> Result<(), PayloadError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PayloadError::InvalidValue {
            kind,
            field: field.to_string(),
            expected: "a finite number",
            value,
        })
    }
}

fn ensure_non_negative(kind: PayloadKind, field: &str, value: f64) -> Result<(), PayloadError> {
    ensure_finite(kind, field, value)?;
    if value < 0.0 {
        return Err(PayloadError::InvalidValue {
            kind,
            field: field.to_string(),
            expected: "non-negative",
            value,
        });
    }
    Ok(())
}

fn ensure_score(kind: PayloadKind, field: &str, value: f64) -> Result<(), PayloadError> {
    ensure_finite(kind, field, value)?;
    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(PayloadError::InvalidValue {
            kind,
            field: field.to_string(),
            expected: "within 0..=100",
            value,
        });
    }
    Ok(())
}

fn validate_scored(kind: PayloadKind, score: f64, items: &[SkillItem]) -> Result<(), PayloadError> {
    ensure_score(kind, "score", score)?;
    for (idx, item) in items.iter().enumerate() {
        ensure_score(kind, &format!("items[{idx}].score"), item.score)?;
    }
    Ok(())
}

impl ChannelPayload {
    /// Parse and validate an unstructured collaborator payload.
    ///
    /// Survey batches are either a bare array or an object wrapping the array under
    /// `items` / `sub_tests`.
    pub fn from_value(kind: PayloadKind, value: Value) -> Result<Self, PayloadError> {
        let payload = match kind {
            PayloadKind::Hard => ChannelPayload::Hard(parse(kind, value)?),
            PayloadKind::Soft => ChannelPayload::Soft(parse(kind, value)?),
            PayloadKind::Survey => {
                let items = match value {
                    Value::Object(mut map) => {
                        match map.remove("items").or_else(|| map.remove("sub_tests")) {
                            Some(items) => items,
                            None => Value::Object(map),
                        }
                    }
                    other => other,
                };
                ChannelPayload::Survey(parse(kind, items)?)
            }
        };

        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        match self {
            ChannelPayload::Hard(result) => result.validate(),
            ChannelPayload::Soft(result) => result.validate(),
            ChannelPayload::Survey(items) => validate_survey(items),
        }
    }
}

impl HardResult {
    /// Channel total and item scores must lie in 0..=100.
    pub fn validate(&self) -> Result<(), PayloadError> {
        validate_scored(PayloadKind::Hard, self.score, &self.items)
    }
}

impl SoftResult {
    pub fn validate(&self) -> Result<(), PayloadError> {
        validate_scored(PayloadKind::Soft, self.score, &self.items)
    }
}

/// Survey scores must be finite and non-negative.
pub fn validate_survey(items: &[SubmittedItem]) -> Result<(), PayloadError> {
    let kind = PayloadKind::Survey;
    for (idx, item) in items.iter().enumerate() {
        ensure_non_negative(kind, &format!("[{idx}].raw_score"), item.raw_score)?;
        ensure_non_negative(kind, &format!("[{idx}].max_score"), item.max_score)?;
    }
    Ok(())
}
