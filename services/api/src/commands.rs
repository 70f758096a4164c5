use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use churn_engine::batch::{read_requests, score_all, write_results, DEFAULT_BATCH_CONCURRENCY};
use churn_engine::config::{AppConfig, ScorerKind};
use churn_engine::error::AppError;
use churn_engine::prediction::{PredictRequest, PredictionEngine};
use churn_engine::telemetry;
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Customer age in years (0-120)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) age: Option<i64>,
    /// Months as a customer (0-120)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) tenure: Option<i64>,
    /// Monthly charges (0-1000)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) monthly_charges: Option<f64>,
    /// Contract type: "Month-to-month", "One year" or "Two year"
    #[arg(long)]
    pub(crate) contract: Option<String>,
    /// Internet service: "DSL", "Fiber optic" or "None"
    #[arg(long)]
    pub(crate) internet_service: Option<String>,
    /// Days the latest payment is overdue (0-60)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) payment_delay: Option<i64>,
    /// Override the configured scorer (rules or process)
    #[arg(long)]
    pub(crate) scorer: Option<ScorerKind>,
}

impl PredictArgs {
    pub(crate) fn to_request(&self) -> PredictRequest {
        PredictRequest {
            age: self.age,
            tenure: self.tenure,
            monthly_charges: self.monthly_charges,
            contract: self.contract.clone(),
            internet_service: self.internet_service.clone(),
            payment_delay: self.payment_delay,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with age,tenure,monthlyCharges,contract,internetService,paymentDelay columns
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the scored CSV (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Maximum predictions in flight
    #[arg(long, default_value_t = DEFAULT_BATCH_CONCURRENCY)]
    pub(crate) concurrency: usize,
    /// Override the configured scorer (rules or process)
    #[arg(long)]
    pub(crate) scorer: Option<ScorerKind>,
}

fn engine_for(scorer: Option<ScorerKind>) -> Result<PredictionEngine, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(kind) = scorer {
        config.scorer.kind = kind;
    }
    telemetry::init(&config.telemetry)?;
    Ok(PredictionEngine::from_config(&config.scorer))
}

pub(crate) async fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let engine = engine_for(args.scorer)?;
    let result = engine.predict(args.to_request()).await?;

    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| AppError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let engine = Arc::new(engine_for(args.scorer)?);

    let inputs = read_requests(BufReader::new(File::open(&args.input)?))?;
    info!(rows = inputs.len(), input = %args.input.display(), "scoring batch");
    let report = score_all(engine, inputs, args.concurrency).await;

    match &args.output {
        Some(path) => write_results(BufWriter::new(File::create(path)?), &report.rows)?,
        None => write_results(io::stdout().lock(), &report.rows)?,
    }

    let summary = &report.summary;
    eprintln!(
        "Scored {} rows: {} churn, {} no churn, {} failed ({} ms)",
        summary.total,
        summary.churn,
        summary.no_churn,
        summary.failed,
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
    Ok(())
}
