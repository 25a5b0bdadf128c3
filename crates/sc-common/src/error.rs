use thiserror::Error;

use crate::candidate::{CandidateId, Channel};
use crate::payload::PayloadError;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("candidate not found: {0}")]
    UnknownCandidate(CandidateId),
    #[error("candidate already registered: {0}")]
    DuplicateCandidate(CandidateId),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no evidence supplied for {0}")]
    EmptyEvidence(String),
    #[error("scoring oracle unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error("oracle does not score the {0} channel")]
    UnsupportedChannel(Channel),
    #[error("screening task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
