use std::env;

use crate::error::ConfigError;
use crate::matching::DEFAULT_SKILL_MATCH_THRESHOLD;
use crate::oracle::DEFAULT_ORACLE;

pub const ENV_SKILL_MATCH_THRESHOLD: &str = "SC_SKILL_MATCH_THRESHOLD";
pub const ENV_ORACLE: &str = "SC_ORACLE";

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub skill_match_threshold: f64,
    pub oracle: String,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            skill_match_threshold: DEFAULT_SKILL_MATCH_THRESHOLD,
            oracle: DEFAULT_ORACLE.to_string(),
        }
    }
}

fn parse_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn parse_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_ascii_lowercase())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Ratio thresholds live in [0, 1].
pub fn validate_threshold(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            key,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

impl ScreeningConfig {
    /// Unparsable values fall back to the defaults; a parsed threshold outside [0, 1] is
    /// rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let skill_match_threshold = validate_threshold(
            ENV_SKILL_MATCH_THRESHOLD,
            parse_f64(ENV_SKILL_MATCH_THRESHOLD, DEFAULT_SKILL_MATCH_THRESHOLD),
        )?;

        Ok(Self {
            skill_match_threshold,
            oracle: parse_string(ENV_ORACLE, DEFAULT_ORACLE),
        })
    }
}
