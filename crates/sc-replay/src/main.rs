use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use sc_common::aggregation::CompositeScoreAggregator;
use sc_common::config::{validate_threshold, ScreeningConfig};
use sc_common::error::{AggregationError, ConfigError, ScreeningError};
use sc_common::logging::{init_tracing_subscriber, install_tracing_panic_hook, LogSettings};
use sc_common::matching::{CandidateRanker, RankedCandidate, SkillMatcher};
use sc_common::oracle::create_oracle;
use sc_common::payload::PayloadKind;
use sc_common::pipeline::{ScreeningPipeline, ScreeningRequest};
use sc_common::report::CandidateReport;
use sc_common::store::CandidateStore;
use sc_common::{Candidate, CandidateId, JobOpening};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const APP_NAME: &str = "sc-replay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RankMode {
    Composite,
    Skills,
    Both,
}

impl RankMode {
    fn composite(self) -> bool {
        matches!(self, RankMode::Composite | RankMode::Both)
    }

    fn skills(self) -> bool {
        matches!(self, RankMode::Skills | RankMode::Both)
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sc-replay",
    about = "Replay candidate channel results and print rankings"
)]
struct Cli {
    /// Replay document: {job, candidates, screenings?, events}
    #[arg(long, env = "SC_REPLAY_FILE")]
    input: PathBuf,

    /// Which rankings to print
    #[arg(long, value_enum, default_value_t = RankMode::Both)]
    rank: RankMode,

    /// Skill match threshold (overrides SC_SKILL_MATCH_THRESHOLD)
    #[arg(long)]
    threshold: Option<f64>,

    /// Include a per-candidate report in the output
    #[arg(long, default_value_t = false)]
    reports: bool,

    /// Stop at the first failing screening or event instead of skipping it
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ReplayCandidate {
    id: i64,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ReplayScreening {
    candidate_id: CandidateId,
    resume_text: String,
    #[serde(default)]
    social_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplayEvent {
    candidate_id: CandidateId,
    channel: PayloadKind,
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct ReplayDocument {
    job: JobOpening,
    candidates: Vec<ReplayCandidate>,
    #[serde(default)]
    screenings: Vec<ReplayScreening>,
    #[serde(default)]
    events: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct FailedStep {
    stage: &'static str,
    index: usize,
    candidate_id: CandidateId,
    channel: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    job_id: i64,
    applied_events: usize,
    failed: Vec<FailedStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    composite_ranking: Option<Vec<RankedCandidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skill_ranking: Option<Vec<RankedCandidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reports: Option<Vec<CandidateReport>>,
}

#[derive(Debug, Clone)]
struct ReplayOptions {
    config: ScreeningConfig,
    rank: RankMode,
    reports: bool,
    strict: bool,
}

#[derive(Debug, Error)]
enum ReplayError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("candidate setup failed: {0}")]
    Setup(#[source] AggregationError),
    #[error("screening #{index} failed: {source}")]
    Screening {
        index: usize,
        #[source]
        source: ScreeningError,
    },
    #[error("event #{index} failed: {source}")]
    Event {
        index: usize,
        #[source]
        source: AggregationError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn load_document(path: &Path) -> Result<ReplayDocument, ReplayError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn screening_failures(
    index: usize,
    candidate_id: CandidateId,
    results: [(&'static str, Option<Result<(), ScreeningError>>); 2],
    strict: bool,
) -> Result<Vec<FailedStep>, ReplayError> {
    let mut failed = Vec::new();
    for (channel, result) in results {
        let Some(Err(source)) = result else {
            continue;
        };
        if strict {
            return Err(ReplayError::Screening { index, source });
        }
        failed.push(FailedStep {
            stage: "screening",
            index,
            candidate_id,
            channel: channel.to_string(),
            error: source.to_string(),
        });
    }
    Ok(failed)
}

async fn replay(
    document: ReplayDocument,
    options: &ReplayOptions,
) -> Result<ReplayOutput, ReplayError> {
    let store = Arc::new(CandidateStore::new());
    for candidate in document.candidates {
        store
            .register(Candidate::new(candidate.id, candidate.full_name))
            .map_err(ReplayError::Setup)?;
    }

    let aggregator = CompositeScoreAggregator::new(Arc::clone(&store));
    let mut failed = Vec::new();

    if !document.screenings.is_empty() {
        let pipeline = ScreeningPipeline::new(
            aggregator.clone(),
            Arc::from(create_oracle(&options.config.oracle)),
        );
        info!(
            oracle = pipeline.oracle_name(),
            screenings = document.screenings.len(),
            "running screenings"
        );

        for (index, screening) in document.screenings.into_iter().enumerate() {
            let candidate_id = screening.candidate_id;
            let request = ScreeningRequest {
                candidate_id,
                job: document.job.clone(),
                resume_text: screening.resume_text,
                social_text: screening.social_text,
            };

            let outcome = match pipeline.screen(request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    let source = ScreeningError::Aggregation(err);
                    failed.extend(screening_failures(
                        index,
                        candidate_id,
                        [("hard", Some(Err(source))), ("soft", None)],
                        options.strict,
                    )?);
                    continue;
                }
            };

            failed.extend(screening_failures(
                index,
                candidate_id,
                [
                    ("hard", Some(outcome.hard.map(|_| ()))),
                    ("soft", outcome.soft.map(|r| r.map(|_| ()))),
                ],
                options.strict,
            )?);
        }
    }

    let mut applied_events = 0;
    for (index, event) in document.events.into_iter().enumerate() {
        match aggregator.apply_json(event.candidate_id, event.channel, event.payload) {
            Ok(_) => applied_events += 1,
            Err(source) if options.strict => return Err(ReplayError::Event { index, source }),
            Err(err) => {
                warn!(
                    index,
                    candidate_id = %event.candidate_id,
                    channel = event.channel.as_ref(),
                    error = %err,
                    "skipping failed event"
                );
                failed.push(FailedStep {
                    stage: "event",
                    index,
                    candidate_id: event.candidate_id,
                    channel: event.channel.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    let candidates = store.snapshots();
    let ranker = CandidateRanker::new(SkillMatcher::new(options.config.skill_match_threshold));

    let output = ReplayOutput {
        job_id: document.job.id,
        applied_events,
        failed,
        composite_ranking: options
            .rank
            .composite()
            .then(|| ranker.rank_by_composite(&candidates)),
        skill_ranking: options
            .rank
            .skills()
            .then(|| ranker.rank_by_skill_match(&document.job, &candidates)),
        reports: options
            .reports
            .then(|| candidates.iter().map(CandidateReport::from_candidate).collect()),
    };

    info!(
        job_id = output.job_id,
        candidates = candidates.len(),
        applied_events = output.applied_events,
        failed = output.failed.len(),
        "replay finished"
    );
    Ok(output)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let log_settings = LogSettings::from_env();
    init_tracing_subscriber(APP_NAME, &log_settings);
    install_tracing_panic_hook(APP_NAME, &log_settings);

    let args = Cli::parse();
    let mut config = ScreeningConfig::from_env()?;
    if let Some(threshold) = args.threshold {
        config.skill_match_threshold = validate_threshold("--threshold", threshold)?;
    }

    let document = load_document(&args.input)?;
    info!(
        input = %args.input.display(),
        job_id = document.job.id,
        candidates = document.candidates.len(),
        events = document.events.len(),
        threshold = config.skill_match_threshold,
        strict = args.strict,
        "loaded replay document"
    );

    let options = ReplayOptions {
        config,
        rank: args.rank,
        reports: args.reports,
        strict: args.strict,
    };
    let output = replay(document, &options).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{APP_NAME} failed: {err}");
        std::process::exit(1);
    }
}
