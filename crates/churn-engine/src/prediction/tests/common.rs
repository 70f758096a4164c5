use std::path::PathBuf;
use std::time::Duration;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::config::ProcessScorerConfig;
use crate::prediction::domain::{Contract, FeatureRecord, InternetService};
use crate::prediction::validation::PredictRequest;

pub(super) fn request(
    age: i64,
    tenure: i64,
    monthly_charges: f64,
    contract: &str,
    internet_service: &str,
    payment_delay: i64,
) -> PredictRequest {
    PredictRequest {
        age: Some(age),
        tenure: Some(tenure),
        monthly_charges: Some(monthly_charges),
        contract: Some(contract.to_string()),
        internet_service: Some(internet_service.to_string()),
        payment_delay: Some(payment_delay),
    }
}

pub(super) fn record(
    tenure: u32,
    contract: Contract,
    internet_service: InternetService,
    payment_delay: u32,
) -> FeatureRecord {
    FeatureRecord::new(40, tenure, 70.0, contract, internet_service, payment_delay)
        .expect("fixture record is valid")
}

/// Customer with a large payment delay on a long contract (scores just above the threshold).
pub(super) fn late_payer() -> PredictRequest {
    request(40, 60, 70.0, "Two year", "DSL", 50)
}

pub(super) fn loyal_customer() -> PredictRequest {
    request(50, 100, 50.0, "Two year", "DSL", 0)
}

pub(super) fn new_fiber_customer() -> PredictRequest {
    request(30, 12, 80.0, "Month-to-month", "Fiber optic", 20)
}

pub(super) fn valid_record() -> FeatureRecord {
    FeatureRecord::try_from(late_payer()).expect("fixture record is valid")
}

/// Scorer configuration that runs `script` through `sh -c`.
pub(super) fn shell_scorer(script: &str) -> ProcessScorerConfig {
    ProcessScorerConfig::new("sh", ["-c", script]).with_timeout(Duration::from_secs(10))
}

pub(super) fn scratch_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "churn-engine-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// True while `pid` names a live (non-zombie) process.
#[cfg(unix)]
pub(super) fn process_running(pid: &str) -> bool {
    let proc_root = std::path::Path::new("/proc");
    if proc_root.join("self").exists() {
        return match std::fs::read_to_string(proc_root.join(pid).join("stat")) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .map_or(true, |(_, fields)| !fields.starts_with('Z')),
            Err(_) => false,
        };
    }

    std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Polls until the process recorded in `pid_file` is gone, for at most five seconds.
#[cfg(unix)]
pub(super) async fn exits_soon(pid_file: &std::path::Path) -> bool {
    let pid = std::fs::read_to_string(pid_file).expect("pid recorded");
    let pid = pid.trim();
    for _ in 0..100 {
        if !process_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
