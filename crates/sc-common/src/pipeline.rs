use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

use crate::aggregation::{ChannelUpdate, CompositeScoreAggregator};
use crate::candidate::{CandidateId, Channel};
use crate::error::{AggregationError, ScreeningError};
use crate::oracle::{Evidence, Rubric, ScoringOracle};
use crate::payload::{HardResult, SoftResult};
use crate::JobOpening;

#[derive(Debug, Clone)]
pub struct ScreeningRequest {
    pub candidate_id: CandidateId,
    pub job: JobOpening,
    pub resume_text: String,
    /// Absent when the candidate linked no social profile; the soft channel then stays
    /// unreported.
    pub social_text: Option<String>,
}

#[derive(Debug)]
pub struct ScreeningOutcome {
    pub candidate_id: CandidateId,
    pub hard: Result<ChannelUpdate, ScreeningError>,
    pub soft: Option<Result<ChannelUpdate, ScreeningError>>,
}

type ChannelTask = JoinHandle<Result<ChannelUpdate, ScreeningError>>;

fn joined(
    result: Result<Result<ChannelUpdate, ScreeningError>, JoinError>,
) -> Result<ChannelUpdate, ScreeningError> {
    result?
}

/// Resume and social evaluation for one candidate, run concurrently.
///
/// Each channel is scored on its own blocking task and applied as soon as it finishes;
/// a failure in one channel leaves the other channel's update in place.
#[derive(Clone)]
pub struct ScreeningPipeline {
    aggregator: CompositeScoreAggregator,
    oracle: Arc<dyn ScoringOracle>,
}

impl ScreeningPipeline {
    pub fn new(aggregator: CompositeScoreAggregator, oracle: Arc<dyn ScoringOracle>) -> Self {
        Self { aggregator, oracle }
    }

    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    fn spawn_channel(
        &self,
        candidate_id: CandidateId,
        evidence: Evidence,
        rubric: Rubric,
    ) -> ChannelTask {
        let oracle = Arc::clone(&self.oracle);
        let aggregator = self.aggregator.clone();

        tokio::task::spawn_blocking(move || -> Result<ChannelUpdate, ScreeningError> {
            let score = oracle.evaluate(&evidence, &rubric)?;
            let items = oracle.itemize(&evidence, &rubric)?;
            let update = match rubric.channel {
                Channel::Hard => aggregator
                    .apply_hard_result(candidate_id, &HardResult::from_channel_score(score, items))?,
                Channel::Soft => aggregator
                    .apply_soft_result(candidate_id, &SoftResult::from_channel_score(score, items))?,
                other => return Err(ScreeningError::UnsupportedChannel(other)),
            };
            Ok(update)
        })
    }

    pub async fn screen(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningOutcome, AggregationError> {
        let candidate_id = request.candidate_id;
        if !self.aggregator.store().contains(candidate_id) {
            return Err(AggregationError::UnknownCandidate(candidate_id));
        }

        let hard = self.spawn_channel(
            candidate_id,
            Evidence::new(request.resume_text),
            Rubric::for_resume(&request.job),
        );
        let soft = request.social_text.map(|text| {
            self.spawn_channel(candidate_id, Evidence::new(text), Rubric::for_social(&request.job))
        });

        let (hard, soft) = match soft {
            Some(soft) => {
                let (hard, soft) = tokio::join!(hard, soft);
                (joined(hard), Some(joined(soft)))
            }
            None => (joined(hard.await), None),
        };

        for (channel, result) in [(Channel::Hard, Some(&hard)), (Channel::Soft, soft.as_ref())] {
            if let Some(Err(err)) = result {
                warn!(
                    candidate_id = %candidate_id,
                    channel = channel.as_ref(),
                    oracle = self.oracle.name(),
                    error = %err,
                    "screening channel failed"
                );
            }
        }
        info!(
            candidate_id = %candidate_id,
            job_id = request.job.id,
            hard_ok = hard.is_ok(),
            soft_ok = soft.as_ref().map(|r| r.is_ok()),
            "screening finished"
        );

        Ok(ScreeningOutcome {
            candidate_id,
            hard,
            soft,
        })
    }
}
