use std::sync::Arc;

use sc_common::aggregation::CompositeScoreAggregator;
use sc_common::matching::{sequence_ratio, skills_match, CandidateRanker, SkillMatcher};
use sc_common::payload::PayloadKind;
use sc_common::report::CandidateReport;
use sc_common::skill_normalizer::normalize_skill;
use sc_common::store::CandidateStore;
use sc_common::{Candidate, CandidateId, Channel, JobOpening};
use serde_json::json;

fn seeded(ids: &[i64]) -> (Arc<CandidateStore>, CompositeScoreAggregator) {
    let store = Arc::new(CandidateStore::new());
    for id in ids {
        store
            .register(Candidate::new(*id, format!("candidate-{id}")))
            .unwrap();
    }
    let aggregator = CompositeScoreAggregator::new(Arc::clone(&store));
    (store, aggregator)
}

fn soft_payload(score: f64) -> serde_json::Value {
    json!({"score": score, "justification": format!("post batch {score}"), "items": []})
}

#[test]
fn normalizer_and_matcher_basics() {
    assert_eq!(normalize_skill("Django 5"), "django");
    assert_eq!(normalize_skill("DJANGO"), "django");

    assert!(skills_match("React", "React.js", 0.8));
    assert!(skills_match("Go", "Golang", 0.8));
    assert_eq!(sequence_ratio("go", "golang"), 0.5);

    let job = JobOpening::new(1, "Frontend", ["React"]);
    assert_eq!(
        SkillMatcher::default().score_candidate_against_job(&[], &job.required_skills),
        0.0
    );
}

#[test]
fn soft_channel_decays_toward_latest() {
    let (store, aggregator) = seeded(&[1]);
    let id = CandidateId(1);
    let expected = [80.0, 60.0, 70.0];

    for (score, want) in [80.0, 40.0, 80.0].into_iter().zip(expected) {
        aggregator
            .apply_json(id, PayloadKind::Soft, soft_payload(score))
            .unwrap();
        let soft = store.snapshot(id).unwrap().channels.soft.unwrap();
        assert_eq!(soft.score, want);
    }

    let soft = store.snapshot(id).unwrap().channels.soft.unwrap();
    assert_eq!(soft.updated_count, 3);
    assert_eq!(soft.justification_text(), "post batch 80");
}

#[test]
fn survey_batches_accumulate_titles_and_skip_unscaled_batches() {
    let (store, aggregator) = seeded(&[1]);
    let id = CandidateId(1);

    let unscaled = json!([{"title": "Warmup", "raw_score": 0, "max_score": 0, "is_feedback_item": false}]);
    aggregator
        .apply_json(id, PayloadKind::Survey, unscaled.clone())
        .unwrap();
    assert!(store.snapshot(id).unwrap().channels.test.is_none());

    aggregator
        .apply_json(
            id,
            PayloadKind::Survey,
            json!([{"title": "A", "raw_score": 8, "max_score": 10, "is_feedback_item": false}]),
        )
        .unwrap();
    aggregator
        .apply_json(
            id,
            PayloadKind::Survey,
            json!([{"title": "B", "raw_score": 6, "max_score": 10, "is_feedback_item": false}]),
        )
        .unwrap();
    aggregator
        .apply_json(id, PayloadKind::Survey, unscaled)
        .unwrap();

    let test = store.snapshot(id).unwrap().channels.test.unwrap();
    assert_eq!(test.score, 70.0);
    assert_eq!(test.updated_count, 2);
    assert_eq!(test.justification_text(), "Survey results: A, B");
}

#[test]
fn qualitative_feedback_stays_out_of_numbers() {
    let (store, aggregator) = seeded(&[1]);
    let id = CandidateId(1);

    aggregator
        .apply_json(
            id,
            PayloadKind::Survey,
            json!({"items": [
                {"title": "Rust", "raw_score": 0, "max_score": 0, "is_feedback_item": true},
                {"title": "Diligence", "raw_score": 9, "max_score": 10, "is_feedback_item": true}
            ]}),
        )
        .unwrap();

    let candidate = store.snapshot(id).unwrap();
    let sentinel = candidate.skills.iter().find(|s| s.title == "Rust").unwrap();
    assert_eq!(sentinel.score, -1.0);

    let report = CandidateReport::from_candidate(&candidate);
    assert_eq!(report.characterizations, vec!["Rust".to_string()]);
    let feedback = report
        .skill_averages
        .iter()
        .find(|a| a.kind == Channel::Feedback)
        .unwrap();
    assert_eq!(feedback.mean, 90.0);
    assert_eq!(feedback.count, 1);

    // a sentinel titled like a required skill is not evidence of that skill
    let job = JobOpening::new(1, "Backend", ["Rust"]);
    let ranked = CandidateRanker::default().rank_by_skill_match(&job, &[candidate]);
    assert_eq!(ranked[0].score, 0.0);
}

#[test]
fn silent_candidates_rank_last() {
    let (store, aggregator) = seeded(&[1, 2, 3]);
    aggregator
        .apply_json(
            CandidateId(3),
            PayloadKind::Hard,
            json!({"score": 12, "justification": "short cv"}),
        )
        .unwrap();
    aggregator
        .apply_json(CandidateId(2), PayloadKind::Soft, soft_payload(5.0))
        .unwrap();

    let ranked = CandidateRanker::default().rank_by_composite(&store.snapshots());
    let order: Vec<i64> = ranked.iter().map(|r| r.candidate_id.0).collect();
    assert_eq!(order, vec![3, 2, 1]);
    assert_eq!(ranked[2].score, 0.0);
}

#[test]
fn rejected_payloads_leave_state_untouched() {
    let (store, aggregator) = seeded(&[1]);
    let id = CandidateId(1);
    aggregator
        .apply_json(id, PayloadKind::Soft, soft_payload(50.0))
        .unwrap();
    let before = store.snapshot(id).unwrap();

    assert!(aggregator
        .apply_json(id, PayloadKind::Soft, json!({"score": 10, "justification": "no items"}))
        .is_err());
    assert!(aggregator
        .apply_json(id, PayloadKind::Survey, json!({"title": "not a batch"}))
        .is_err());
    assert!(aggregator
        .apply_json(CandidateId(2), PayloadKind::Soft, soft_payload(10.0))
        .is_err());

    assert_eq!(store.snapshot(id).unwrap(), before);
}

#[tokio::test]
async fn concurrent_channel_results_are_serialized_per_candidate() {
    let (store, aggregator) = seeded(&[1, 2]);
    let per_candidate = 25_u32;

    let mut tasks = Vec::new();
    for id in [1, 2] {
        for n in 0..per_candidate {
            let aggregator = aggregator.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                aggregator
                    .apply_json(CandidateId(id), PayloadKind::Soft, soft_payload(f64::from(n)))
                    .map(|_| ())
            }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for candidate in store.snapshots() {
        let soft = candidate.channels.soft.unwrap();
        assert_eq!(soft.updated_count, per_candidate);
        assert!((0.0..25.0).contains(&soft.score));
    }
}

#[test]
fn removing_a_candidate_drops_its_records() {
    let (store, aggregator) = seeded(&[1]);
    aggregator
        .apply_json(
            CandidateId(1),
            PayloadKind::Hard,
            json!({"score": 70, "justification": "cv", "items": [{"title": "SQL", "score": 70}]}),
        )
        .unwrap();

    let removed = store.remove(CandidateId(1)).unwrap();
    assert_eq!(removed.skills.len(), 1);
    assert!(store.is_empty());
    assert!(aggregator
        .apply_json(CandidateId(1), PayloadKind::Soft, soft_payload(1.0))
        .is_err());
}
