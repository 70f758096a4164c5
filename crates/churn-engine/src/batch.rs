//! CSV batch scoring with bounded concurrency.
//!
//! Input columns mirror the request field names (`age`, `tenure`, `monthlyCharges`, `contract`,
//! `internetService`, `paymentDelay`); extra columns are ignored and blank cells count as missing.
//! A row that fails validation or scoring is reported in place and never aborts the batch.

use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::prediction::{ChurnLabel, PredictRequest, PredictionEngine, PredictionResult};

pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid batch CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to access batch file: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed input line. `row` is 1-based over data lines.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInput {
    pub row: usize,
    pub request: Result<PredictRequest, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub row: usize,
    pub outcome: Result<PredictionResult, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub churn: usize,
    pub no_churn: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    age: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    tenure: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    monthly_charges: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    contract: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    internet_service: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    payment_delay: Option<String>,
}

impl CsvRow {
    fn into_request(self) -> Result<PredictRequest, String> {
        Ok(PredictRequest {
            age: parse_cell("age", self.age)?,
            tenure: parse_cell("tenure", self.tenure)?,
            monthly_charges: parse_cell("monthlyCharges", self.monthly_charges)?,
            contract: self.contract,
            internet_service: self.internet_service,
            payment_delay: parse_cell("paymentDelay", self.payment_delay)?,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_cell<T: FromStr>(field: &str, raw: Option<String>) -> Result<Option<T>, String> {
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|_| format!("{field}: '{value}' is not a number"))
    })
    .transpose()
}

/// Parses every data line. Structural CSV errors fail the whole read; bad cell values are kept
/// as per-row errors.
pub fn read_requests<R: Read>(reader: R) -> Result<Vec<BatchInput>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut inputs = Vec::new();
    for (index, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        inputs.push(BatchInput {
            row: index + 1,
            request: row.into_request(),
        });
    }

    Ok(inputs)
}

/// Scores every input with at most `concurrency` predictions in flight; rows come back in input
/// order.
pub async fn score_all(
    engine: Arc<PredictionEngine>,
    inputs: Vec<BatchInput>,
    concurrency: usize,
) -> BatchReport {
    let started_at = Utc::now();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for input in inputs {
        let engine = engine.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let outcome = match input.request {
                Ok(request) => engine.predict(request).await.map_err(|err| err.to_string()),
                Err(message) => Err(message),
            };
            BatchRow {
                row: input.row,
                outcome,
            }
        });
    }

    let mut rows = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(row) => rows.push(row),
            Err(err) => warn!(error = %err, "batch prediction task aborted"),
        }
    }
    rows.sort_by_key(|row| row.row);

    let summary = summarize(&rows, started_at, Utc::now());
    info!(
        total = summary.total,
        churn = summary.churn,
        failed = summary.failed,
        "batch scoring finished"
    );

    BatchReport { rows, summary }
}

fn summarize(
    rows: &[BatchRow],
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> BatchSummary {
    let mut summary = BatchSummary {
        total: rows.len(),
        churn: 0,
        no_churn: 0,
        failed: 0,
        started_at,
        finished_at,
    };

    for row in rows {
        match &row.outcome {
            Ok(result) if result.label == ChurnLabel::Churn => summary.churn += 1,
            Ok(_) => summary.no_churn += 1,
            Err(_) => summary.failed += 1,
        }
    }

    summary
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvResult<'a> {
    row: usize,
    label: Option<&'static str>,
    score: Option<f64>,
    votes: Option<u32>,
    model_version: Option<&'a str>,
    error: Option<&'a str>,
}

/// Writes one output line per row: row,label,score,votes,modelVersion,error.
pub fn write_results<W: Write>(writer: W, rows: &[BatchRow]) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for row in rows {
        let record = match &row.outcome {
            Ok(result) => CsvResult {
                row: row.row,
                label: Some(result.label.label()),
                score: Some(result.score),
                votes: Some(result.votes),
                model_version: result.model_version.as_deref(),
                error: None,
            },
            Err(message) => CsvResult {
                row: row.row,
                label: None,
                score: None,
                votes: None,
                model_version: None,
                error: Some(message),
            },
        };
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
