//! Out-of-process scoring over a one-shot JSON protocol.
//!
//! Each call spawns the configured program, writes one JSON document describing the customer to
//! its stdin, closes stdin, drains stdout and stderr to EOF and waits for the exit status, all
//! under a single wall-clock budget. Exit code zero means stdout carries the result document;
//! anything else means the scorer rejected the input and stderr explains why.
//!
//! On unix the scorer leads its own process group. Once the leader exits, or the call fails or is
//! dropped, the whole group is killed so helper processes holding the pipes cannot outlive it.

use std::io;
use std::process::{ExitStatus, Stdio};

use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::domain::{ChurnLabel, FeatureRecord, PredictionResult};
use super::error::PredictionError;
use crate::config::ProcessScorerConfig;

/// Longest stderr excerpt surfaced to callers when the scorer gives no structured error.
pub const STDERR_EXCERPT_CHARS: usize = 200;
const DEFAULT_REJECTION_MESSAGE: &str = "Prediction failed (scorer error).";

/// Scorer that delegates to an external program, one process per call.
#[derive(Debug, Clone)]
pub struct ProcessScorer {
    config: ProcessScorerConfig,
}

/// Everything the scorer process produced before it exited.
#[derive(Debug)]
struct ScorerOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl ProcessScorer {
    pub fn new(config: ProcessScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessScorerConfig {
        &self.config
    }

    pub async fn score(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        let payload = serde_json::to_vec(record).map_err(|err| {
            PredictionError::from_io(io::Error::new(io::ErrorKind::InvalidData, err))
        })?;

        let mut child = self.spawn()?;
        let pid = child.id();
        let mut group = ProcessGroup::led_by(pid);

        let exchanged =
            tokio::time::timeout(self.config.timeout, exchange(&mut child, &payload, &group))
                .await;

        let outcome = match exchanged {
            Ok(Ok(output)) => {
                debug!(?pid, status = %output.status, "scorer process exited");
                interpret(output)
            }
            Ok(Err(err)) => {
                warn!(?pid, kind = err.kind().label(), error = %err, "scorer exchange failed");
                terminate(&mut child, &group).await;
                Err(err)
            }
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(?pid, timeout_ms, "scorer process timed out; killing it");
                terminate(&mut child, &group).await;
                Err(PredictionError::timeout())
            }
        };

        group.release();
        outcome
    }

    fn spawn(&self) -> Result<Child, PredictionError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|err| {
            warn!(
                program = %self.config.program,
                working_dir = %self.config.working_dir.display(),
                error = %err,
                "failed to start scorer process"
            );
            PredictionError::from_io(err)
        })?;

        debug!(pid = ?child.id(), program = %self.config.program, "spawned scorer process");
        Ok(child)
    }
}

/// Signals the scorer's process group. Dropping an unreleased handle kills the group, which covers
/// a `score` future cancelled mid-call.
#[derive(Debug)]
struct ProcessGroup {
    leader: Option<i32>,
}

impl ProcessGroup {
    fn led_by(pid: Option<u32>) -> Self {
        Self {
            leader: pid.and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    #[cfg(unix)]
    fn kill(&self) {
        let Some(leader) = self.leader else {
            return;
        };
        // SAFETY: kill(2) has no memory-safety preconditions; a negative pid targets the group.
        if unsafe { libc::kill(-leader, libc::SIGKILL) } != 0 {
            debug!(
                pgid = leader,
                error = %io::Error::last_os_error(),
                "scorer process group already gone"
            );
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {
        let _ = self.leader;
    }

    /// Stops the drop guard once the group has been torn down explicitly.
    fn release(&mut self) {
        self.leader = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Writes the request, then drains both output streams while waiting for the child. When the
/// child exits its group is killed, so leftover helpers release the pipes and the drain finishes.
async fn exchange(
    child: &mut Child,
    payload: &[u8],
    group: &ProcessGroup,
) -> Result<ScorerOutput, PredictionError> {
    let mut stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    match stdin.write_all(payload).await {
        Ok(()) => stdin.flush().await?,
        // The scorer may reject the input without reading it; its exit status decides.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("scorer closed stdin before reading the full request");
        }
        Err(err) => return Err(err.into()),
    }
    drop(stdin);

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let (_, _, status) = tokio::try_join!(
        stdout.read_to_end(&mut stdout_buf),
        stderr.read_to_end(&mut stderr_buf),
        async {
            let status = child.wait().await?;
            group.kill();
            Ok::<_, io::Error>(status)
        }
    )?;

    Ok(ScorerOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
    })
}

fn missing_pipe(name: &str) -> PredictionError {
    PredictionError::from_io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("scorer {name} was not captured"),
    ))
}

/// Kills the process group and reaps the child so no scorer outlives a failed call.
async fn terminate(child: &mut Child, group: &ProcessGroup) {
    group.kill();
    if let Err(err) = child.start_kill() {
        debug!(error = %err, "scorer process already exited");
    }
    if let Err(err) = child.wait().await {
        warn!(error = %err, "failed to reap scorer process");
    }
}

fn interpret(output: ScorerOutput) -> Result<PredictionResult, PredictionError> {
    if !output.status.success() {
        let message = rejection_message(&output.stderr);
        warn!(status = %output.status, %message, "scorer rejected request");
        return Err(PredictionError::rejected(message));
    }

    parse_response(&output.stdout)
}

/// Prefers a structured `{"error": "..."}` document on stderr, else a bounded raw excerpt.
pub(crate) fn rejection_message(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        return DEFAULT_REJECTION_MESSAGE.to_string();
    }

    if let Ok(Value::Object(document)) = serde_json::from_str::<Value>(stderr) {
        if let Some(Value::String(message)) = document.get("error") {
            return message.clone();
        }
    }

    let mut chars = stderr.chars();
    let excerpt: String = chars.by_ref().take(STDERR_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{excerpt}...")
    } else {
        excerpt
    }
}

/// Decodes the success document. Missing or mistyped fields fall back to defaults; only a body
/// that is not a JSON object is treated as malformed.
pub(crate) fn parse_response(stdout: &str) -> Result<PredictionResult, PredictionError> {
    let document = match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(Value::Object(document)) => document,
        Ok(other) => {
            return Err(PredictionError::malformed(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            )))
        }
        Err(err) => return Err(PredictionError::malformed(err)),
    };

    let label = match document.get("label") {
        Some(Value::String(label)) if label == ChurnLabel::Churn.label() => ChurnLabel::Churn,
        _ => ChurnLabel::NoChurn,
    };

    Ok(PredictionResult::new(
        label,
        score_field(&document),
        Vec::new(),
        model_version_field(&document),
    ))
}

fn score_field(document: &Map<String, Value>) -> f64 {
    match document.get("score") {
        Some(Value::Number(score)) => score.as_f64().unwrap_or(0.0),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn model_version_field(document: &Map<String, Value>) -> Option<String> {
    match document.get("model_version") {
        Some(Value::String(version)) => Some(version.clone()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
