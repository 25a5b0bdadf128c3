//! Folding partial channel results into per-candidate running totals.

pub mod blend;
pub mod survey;

pub use blend::{blend, BLEND_WEIGHT};
pub use survey::{percentage, BatchTally, SurveyPartition, FEEDBACK_JUSTIFICATION};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::AsRefStr;
use tracing::{debug, info};

use crate::candidate::{Candidate, CandidateId, Channel, ChannelTotal, Justification, SkillRecord};
use crate::error::AggregationError;
use crate::payload::{
    validate_survey, ChannelPayload, HardResult, PayloadKind, SkillItem, SoftResult,
    SubmittedItem,
};
use crate::store::CandidateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TotalAction {
    Created,
    Replaced,
    Blended,
    /// Nothing to fold in (no items or no scale); the total is untouched.
    Skipped,
}

/// What one apply did to a single channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelUpdate {
    pub channel: Channel,
    pub action: TotalAction,
    /// Channel total after the update; `None` while the channel has never reported.
    pub score: Option<f64>,
    pub updated_count: u32,
    pub records_appended: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyOutcome {
    pub test: ChannelUpdate,
    pub feedback: ChannelUpdate,
    /// Qualitative-only feedback items recorded with the sentinel score.
    pub characterizations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ApplyOutcome {
    Hard(ChannelUpdate),
    Soft(ChannelUpdate),
    Survey(SurveyOutcome),
}

fn channel_update(
    candidate: &Candidate,
    channel: Channel,
    action: TotalAction,
    records_appended: usize,
) -> ChannelUpdate {
    let total = candidate.channels.get(channel);
    let update = ChannelUpdate {
        channel,
        action,
        score: total.map(|t| t.score),
        updated_count: total.map(|t| t.updated_count).unwrap_or(0),
        records_appended,
    };

    if action == TotalAction::Skipped {
        debug!(
            candidate_id = %candidate.id,
            channel = channel.as_ref(),
            records_appended,
            "channel total unchanged"
        );
    } else {
        info!(
            candidate_id = %candidate.id,
            channel = channel.as_ref(),
            action = action.as_ref(),
            score = update.score,
            updated_count = update.updated_count,
            records_appended,
            "channel total updated"
        );
    }
    update
}

/// Create the slot on first arrival, otherwise blend the score in.
///
/// Source-set justifications are unioned; anything else is replaced by the incoming one.
fn create_or_blend(
    slot: &mut Option<ChannelTotal>,
    score: f64,
    justification: Justification,
) -> TotalAction {
    let Some(total) = slot.as_mut() else {
        *slot = Some(ChannelTotal::new(score, justification));
        return TotalAction::Created;
    };

    total.blend_in(score);
    match justification {
        Justification::Sources(titles)
            if matches!(total.justification, Justification::Sources(_)) =>
        {
            total.justification.extend_sources(titles)
        }
        other => total.justification = other,
    }
    TotalAction::Blended
}

fn append_items(candidate: &mut Candidate, kind: Channel, items: &[SkillItem]) -> usize {
    candidate.skills.extend(items.iter().map(|item| {
        SkillRecord::scored(item.title.clone(), item.score, kind, item.justification.clone())
    }));
    items.len()
}

/// Items without a scale carry no score and leave no record behind.
fn append_percentages(candidate: &mut Candidate, kind: Channel, items: &[&SubmittedItem]) -> usize {
    let before = candidate.skills.len();
    candidate.skills.extend(items.iter().filter_map(|item| {
        percentage(item.raw_score, item.max_score)
            .map(|score| SkillRecord::scored(item.title.clone(), score, kind, None))
    }));
    candidate.skills.len() - before
}

/// The resume result is authoritative: last write wins.
fn apply_hard(candidate: &mut Candidate, result: &HardResult) -> ChannelUpdate {
    let justification = Justification::Narrative(result.justification.clone());
    let slot = candidate.channels.slot_mut(Channel::Hard);
    let action = if let Some(total) = slot.as_mut() {
        total.overwrite(result.score, justification);
        TotalAction::Replaced
    } else {
        *slot = Some(ChannelTotal::new(result.score, justification));
        TotalAction::Created
    };

    let appended = append_items(candidate, Channel::Hard, &result.items);
    channel_update(candidate, Channel::Hard, action, appended)
}

fn apply_soft(candidate: &mut Candidate, result: &SoftResult) -> ChannelUpdate {
    let action = create_or_blend(
        candidate.channels.slot_mut(Channel::Soft),
        result.score,
        Justification::Narrative(result.justification.clone()),
    );

    let appended = append_items(candidate, Channel::Soft, &result.items);
    channel_update(candidate, Channel::Soft, action, appended)
}

fn apply_survey(candidate: &mut Candidate, items: &[SubmittedItem]) -> SurveyOutcome {
    let partition = SurveyPartition::new(items);

    let test_records = append_percentages(candidate, Channel::Test, &partition.test);
    let tally = partition.test_tally();
    let test_action = match tally.percentage() {
        Some(batch) => create_or_blend(
            candidate.channels.slot_mut(Channel::Test),
            batch,
            Justification::sources(&tally.titles),
        ),
        None => TotalAction::Skipped,
    };
    let test = channel_update(candidate, Channel::Test, test_action, test_records);

    candidate.skills.extend(
        partition
            .qualitative
            .iter()
            .map(|item| SkillRecord::qualitative(item.title.clone())),
    );
    let characterizations = partition.qualitative.len();

    let feedback_records = append_percentages(candidate, Channel::Feedback, &partition.feedback);
    let feedback_action = match partition.feedback_tally().percentage() {
        Some(batch) => create_or_blend(
            candidate.channels.slot_mut(Channel::Feedback),
            batch,
            Justification::Fixed(FEEDBACK_JUSTIFICATION.to_string()),
        ),
        None => TotalAction::Skipped,
    };
    let feedback = channel_update(
        candidate,
        Channel::Feedback,
        feedback_action,
        feedback_records + characterizations,
    );

    SurveyOutcome {
        test,
        feedback,
        characterizations,
    }
}

/// Applies collaborator results to candidates held in a [`CandidateStore`].
///
/// Every payload is validated before the candidate is locked, so a rejected payload never
/// leaves a partial update behind.
#[derive(Debug, Clone)]
pub struct CompositeScoreAggregator {
    store: Arc<CandidateStore>,
}

impl CompositeScoreAggregator {
    pub fn new(store: Arc<CandidateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<CandidateStore> {
        &self.store
    }

    pub fn apply_hard_result(
        &self,
        candidate_id: CandidateId,
        result: &HardResult,
    ) -> Result<ChannelUpdate, AggregationError> {
        result.validate()?;
        self.store
            .update(candidate_id, |candidate| apply_hard(candidate, result))
    }

    pub fn apply_soft_result(
        &self,
        candidate_id: CandidateId,
        result: &SoftResult,
    ) -> Result<ChannelUpdate, AggregationError> {
        result.validate()?;
        self.store
            .update(candidate_id, |candidate| apply_soft(candidate, result))
    }

    pub fn apply_test_result(
        &self,
        candidate_id: CandidateId,
        items: &[SubmittedItem],
    ) -> Result<SurveyOutcome, AggregationError> {
        validate_survey(items)?;
        self.store
            .update(candidate_id, |candidate| apply_survey(candidate, items))
    }

    pub fn apply_payload(
        &self,
        candidate_id: CandidateId,
        payload: &ChannelPayload,
    ) -> Result<ApplyOutcome, AggregationError> {
        match payload {
            ChannelPayload::Hard(result) => self
                .apply_hard_result(candidate_id, result)
                .map(ApplyOutcome::Hard),
            ChannelPayload::Soft(result) => self
                .apply_soft_result(candidate_id, result)
                .map(ApplyOutcome::Soft),
            ChannelPayload::Survey(items) => self
                .apply_test_result(candidate_id, items)
                .map(ApplyOutcome::Survey),
        }
    }

    /// Parse an unstructured collaborator payload and apply it.
    pub fn apply_json(
        &self,
        candidate_id: CandidateId,
        kind: PayloadKind,
        value: Value,
    ) -> Result<ApplyOutcome, AggregationError> {
        let payload = ChannelPayload::from_value(kind, value)?;
        self.apply_payload(candidate_id, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::SkillMatcher;
    use crate::payload::PayloadError;
    use crate::RequiredSkill;
    use serde_json::json;

    fn setup() -> (CompositeScoreAggregator, CandidateId) {
        let store = Arc::new(CandidateStore::new());
        store.register(Candidate::new(1, "Aigerim")).unwrap();
        (CompositeScoreAggregator::new(store), CandidateId(1))
    }

    fn soft(score: f64, justification: &str) -> SoftResult {
        SoftResult {
            score,
            justification: justification.to_string(),
            items: vec![],
        }
    }

    fn total(aggregator: &CompositeScoreAggregator, channel: Channel) -> Option<ChannelTotal> {
        aggregator
            .store()
            .snapshot(CandidateId(1))
            .unwrap()
            .channels
            .get(channel)
            .cloned()
    }

    #[test]
    fn hard_result_overwrites() {
        let (aggregator, id) = setup();
        let first = HardResult {
            score: 60.0,
            justification: "first".into(),
            items: vec![],
        };
        let second = HardResult {
            score: 20.0,
            justification: "second".into(),
            items: vec![SkillItem {
                title: "Rust".into(),
                score: 70.0,
                justification: Some("2 years".into()),
            }],
        };

        let created = aggregator.apply_hard_result(id, &first).unwrap();
        let replaced = aggregator.apply_hard_result(id, &second).unwrap();

        assert_eq!(created.action, TotalAction::Created);
        assert_eq!(replaced.action, TotalAction::Replaced);
        assert_eq!(replaced.score, Some(20.0));
        assert_eq!(replaced.updated_count, 2);
        assert_eq!(replaced.records_appended, 1);

        let candidate = aggregator.store().snapshot(id).unwrap();
        assert_eq!(candidate.channels.hard.as_ref().unwrap().justification_text(), "second");
        assert_eq!(candidate.skills_of(Channel::Hard).count(), 1);
    }

    #[test]
    fn soft_updates_follow_the_iterated_blend() {
        let (aggregator, id) = setup();

        aggregator.apply_soft_result(id, &soft(60.0, "one")).unwrap();
        assert_eq!(total(&aggregator, Channel::Soft).unwrap().score, 60.0);

        aggregator.apply_soft_result(id, &soft(20.0, "two")).unwrap();
        assert_eq!(total(&aggregator, Channel::Soft).unwrap().score, 40.0);

        let update = aggregator.apply_soft_result(id, &soft(100.0, "three")).unwrap();
        // 60/4 + 20/4 + 100/2
        assert_eq!(update.score, Some(70.0));
        assert_eq!(update.action, TotalAction::Blended);

        let soft_total = total(&aggregator, Channel::Soft).unwrap();
        assert_eq!(soft_total.updated_count, 3);
        assert_eq!(soft_total.justification_text(), "three");
    }

    #[test]
    fn soft_items_are_appended_as_soft_records() {
        let (aggregator, id) = setup();
        let result = SoftResult {
            score: 50.0,
            justification: "friendly".into(),
            items: vec![
                SkillItem {
                    title: "Communication".into(),
                    score: 80.0,
                    justification: None,
                },
                SkillItem {
                    title: "Communication".into(),
                    score: 40.0,
                    justification: Some("later post".into()),
                },
            ],
        };

        aggregator.apply_soft_result(id, &result).unwrap();
        let candidate = aggregator.store().snapshot(id).unwrap();
        let scores: Vec<f64> = candidate.skills_of(Channel::Soft).map(|s| s.score).collect();
        assert_eq!(scores, vec![80.0, 40.0]);
    }

    #[test]
    fn consecutive_survey_batches_blend_and_union_titles() {
        let (aggregator, id) = setup();

        aggregator
            .apply_test_result(id, &[SubmittedItem::test("A", 8.0, 10.0)])
            .unwrap();
        let outcome = aggregator
            .apply_test_result(id, &[SubmittedItem::test("B", 6.0, 10.0)])
            .unwrap();

        assert_eq!(outcome.test.score, Some(70.0));
        let test_total = total(&aggregator, Channel::Test).unwrap();
        assert_eq!(test_total.justification_text(), "Survey results: A, B");

        aggregator
            .apply_test_result(id, &[SubmittedItem::test("A", 8.0, 10.0)])
            .unwrap();
        let test_total = total(&aggregator, Channel::Test).unwrap();
        assert_eq!(test_total.score, 75.0);
        assert_eq!(test_total.justification_text(), "Survey results: A, B");
        assert_eq!(test_total.updated_count, 3);
    }

    #[test]
    fn zero_scale_batch_leaves_test_total_alone() {
        let (aggregator, id) = setup();

        let outcome = aggregator
            .apply_test_result(id, &[SubmittedItem::test("Empty", 0.0, 0.0)])
            .unwrap();
        assert_eq!(outcome.test.action, TotalAction::Skipped);
        assert_eq!(outcome.test.records_appended, 0);
        assert!(total(&aggregator, Channel::Test).is_none());

        aggregator
            .apply_test_result(id, &[SubmittedItem::test("A", 8.0, 10.0)])
            .unwrap();
        aggregator
            .apply_test_result(id, &[SubmittedItem::test("Empty", 3.0, 0.0)])
            .unwrap();

        let test_total = total(&aggregator, Channel::Test).unwrap();
        assert_eq!(test_total.score, 80.0);
        assert_eq!(test_total.updated_count, 1);

        let candidate = aggregator.store().snapshot(id).unwrap();
        let percentages: Vec<f64> = candidate.skills_of(Channel::Test).map(|s| s.score).collect();
        assert_eq!(percentages, vec![80.0]);
    }

    #[test]
    fn unscaled_items_do_not_dilute_skill_evidence() {
        let (aggregator, id) = setup();
        aggregator
            .apply_hard_result(
                id,
                &HardResult {
                    score: 90.0,
                    justification: "cv".into(),
                    items: vec![SkillItem {
                        title: "Python".into(),
                        score: 90.0,
                        justification: None,
                    }],
                },
            )
            .unwrap();
        let outcome = aggregator
            .apply_test_result(
                id,
                &[
                    SubmittedItem::test("Python", 0.0, 0.0),
                    SubmittedItem::feedback("Python", 2.0, 0.0),
                ],
            )
            .unwrap();
        assert_eq!(outcome.test.records_appended, 0);
        assert_eq!(outcome.feedback.records_appended, 0);

        let candidate = aggregator.store().snapshot(id).unwrap();
        assert_eq!(candidate.skills.len(), 1);
        let required = [RequiredSkill::new("Python")];
        let score =
            SkillMatcher::default().score_candidate_against_job(&candidate.skills, &required);
        assert_eq!(score, 90.0);
    }

    #[test]
    fn qualitative_feedback_is_recorded_with_sentinel() {
        let (aggregator, id) = setup();

        let outcome = aggregator
            .apply_test_result(
                id,
                &[
                    SubmittedItem::feedback("Calm under pressure", 0.0, 0.0),
                    SubmittedItem::feedback("Reliability", 4.0, 5.0),
                ],
            )
            .unwrap();

        assert_eq!(outcome.characterizations, 1);
        assert_eq!(outcome.feedback.action, TotalAction::Created);
        assert_eq!(outcome.feedback.score, Some(80.0));
        assert_eq!(outcome.test.action, TotalAction::Skipped);

        let candidate = aggregator.store().snapshot(id).unwrap();
        let sentinel = candidate
            .skills
            .iter()
            .find(|s| s.title == "Calm under pressure")
            .unwrap();
        assert_eq!(sentinel.score, -1.0);
        assert_eq!(sentinel.kind, Channel::Feedback);
        assert_eq!(
            sentinel.justification.as_deref(),
            Some("former-employer qualitative note")
        );
        assert_eq!(
            candidate.channels.feedback.unwrap().justification_text(),
            "mean of employer feedback"
        );
    }

    #[test]
    fn sentinel_only_batch_creates_no_feedback_total() {
        let (aggregator, id) = setup();
        aggregator
            .apply_test_result(id, &[SubmittedItem::feedback("Honest", 0.0, 0.0)])
            .unwrap();

        assert!(total(&aggregator, Channel::Feedback).is_none());
        let candidate = aggregator.store().snapshot(id).unwrap();
        assert_eq!(candidate.characterizations(), vec!["Honest".to_string()]);
    }

    #[test]
    fn feedback_and_test_totals_are_independent() {
        let (aggregator, id) = setup();
        aggregator
            .apply_test_result(
                id,
                &[
                    SubmittedItem::test("Logic", 9.0, 10.0),
                    SubmittedItem::feedback("Teamwork", 2.0, 10.0),
                ],
            )
            .unwrap();

        assert_eq!(total(&aggregator, Channel::Test).unwrap().score, 90.0);
        assert_eq!(total(&aggregator, Channel::Feedback).unwrap().score, 20.0);
    }

    #[test]
    fn malformed_json_touches_nothing() {
        let (aggregator, id) = setup();
        let err = aggregator
            .apply_json(id, PayloadKind::Soft, json!({"score": "high"}))
            .unwrap_err();
        assert!(matches!(err, AggregationError::Payload(PayloadError::Malformed { .. })));

        let err = aggregator
            .apply_json(
                id,
                PayloadKind::Survey,
                json!([
                    {"title": "A", "raw_score": 8, "max_score": 10, "is_feedback_item": false},
                    {"title": "B", "raw_score": -2, "max_score": 10, "is_feedback_item": false}
                ]),
            )
            .unwrap_err();
        assert!(matches!(err, AggregationError::Payload(PayloadError::InvalidValue { .. })));

        let candidate = aggregator.store().snapshot(id).unwrap();
        assert!(candidate.skills.is_empty());
        assert_eq!(candidate.channels.reported().count(), 0);
    }

    #[test]
    fn unknown_candidate_fails() {
        let (aggregator, _) = setup();
        let err = aggregator
            .apply_soft_result(CandidateId(99), &soft(10.0, "x"))
            .unwrap_err();
        assert!(matches!(err, AggregationError::UnknownCandidate(CandidateId(99))));
    }

    #[test]
    fn apply_json_reports_outcome_kind() {
        let (aggregator, id) = setup();
        let outcome = aggregator
            .apply_json(
                id,
                PayloadKind::Hard,
                json!({"total": 55, "justification": "cv"}),
            )
            .unwrap();

        let ApplyOutcome::Hard(update) = outcome else {
            panic!("expected hard outcome");
        };
        assert_eq!(update.score, Some(55.0));
    }

    #[test]
    fn concurrent_updates_to_one_candidate_are_all_counted() {
        let (aggregator, id) = setup();
        let workers = 16;

        std::thread::scope(|scope| {
            for n in 0..workers {
                let aggregator = aggregator.clone();
                scope.spawn(move || {
                    aggregator
                        .apply_soft_result(id, &soft(n as f64, "parallel"))
                        .unwrap();
                });
            }
        });

        let soft_total = total(&aggregator, Channel::Soft).unwrap();
        assert_eq!(soft_total.updated_count, workers);
    }
}
