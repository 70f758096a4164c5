use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::{model_metrics_router, MetricsError, MetricsProvider};

const SAMPLE_METRICS: &str = r#"{
  "model": {
    "name": "RandomForest churn",
    "version": "rf-v2",
    "lastTrainedAt": "2025-09-30T12:00:00Z",
    "dataset": "sample_churn.csv"
  },
  "kpis": { "accuracy": 0.87, "f1": 0.71, "rocAuc": 0.91, "churnRate": 0.26, "samples": 2000 },
  "confusionMatrix": { "labels": ["NO_CHURN", "CHURN"], "matrix": [[1300, 180], [80, 440]] },
  "rocCurve": [{ "fpr": 0.0, "tpr": 0.0 }, { "fpr": 0.1, "tpr": 0.7 }, { "fpr": 1.0, "tpr": 1.0 }],
  "featureImportance": [
    { "feature": "paymentDelay", "importance": 0.41 },
    { "feature": "tenure", "importance": 0.22 }
  ],
  "trainingParams": { "n_estimators": 200 }
}"#;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "churn-engine-metrics-{}-{name}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[test]
fn resolve_skips_missing_candidates() {
    let dir = scratch_dir("resolve");
    let fallback = dir.join("metrics.json");
    fs::write(&fallback, SAMPLE_METRICS).expect("write metrics");

    let provider = MetricsProvider::with_candidates(vec![
        dir.join("missing.json"),
        dir.clone(),
        fallback.clone(),
    ]);

    assert_eq!(provider.resolve(), Some(fallback.as_path()));
}

#[test]
fn new_appends_fallback_locations() {
    let provider = MetricsProvider::new("/etc/churn/metrics.json");
    let candidates: Vec<_> = provider
        .candidates()
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();

    assert_eq!(
        candidates,
        vec![
            "/etc/churn/metrics.json",
            "backend/models/metrics.json",
            "models/metrics.json"
        ]
    );
}

#[tokio::test]
async fn load_parses_artifact_and_ignores_unknown_sections() {
    let dir = scratch_dir("load");
    let path = dir.join("metrics.json");
    fs::write(&path, SAMPLE_METRICS).expect("write metrics");

    let metrics = MetricsProvider::with_candidates(vec![path])
        .load()
        .await
        .expect("metrics load");

    let model = metrics.model.expect("model section");
    assert_eq!(model.version.as_deref(), Some("rf-v2"));
    assert_eq!(model.notes, None);
    assert_eq!(metrics.kpis.expect("kpis").samples, 2000);
    assert_eq!(metrics.confusion_matrix.expect("matrix").matrix.len(), 2);
    assert_eq!(metrics.roc_curve.len(), 3);
    assert_eq!(metrics.feature_importance[0].feature, "paymentDelay");
}

#[tokio::test]
async fn load_reports_missing_and_invalid_artifacts() {
    let dir = scratch_dir("errors");
    let missing = MetricsProvider::with_candidates(vec![dir.join("absent.json")]);
    match missing.load().await {
        Err(MetricsError::NotFound { searched }) => assert!(searched.contains("absent.json")),
        other => panic!("expected not found, got {other:?}"),
    }

    let broken = dir.join("broken.json");
    fs::write(&broken, "{ not json").expect("write broken");
    let provider = MetricsProvider::with_candidates(vec![broken]);
    assert!(matches!(
        provider.load().await,
        Err(MetricsError::Invalid { .. })
    ));
    assert!(provider.feature_importance().await.is_empty());
}

#[tokio::test]
async fn metrics_route_surfaces_configuration_errors() {
    let dir = scratch_dir("route-missing");
    let provider = Arc::new(MetricsProvider::with_candidates(vec![
        dir.join("absent.json")
    ]));

    let response = model_metrics_router(provider.clone())
        .oneshot(
            Request::get("/api/model/metrics")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], 500);
    assert!(payload["message"]
        .as_str()
        .expect("message present")
        .contains("not found"));

    let response = model_metrics_router(provider)
        .oneshot(
            Request::get("/api/model/feature-importance")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, Value::Array(Vec::new()));
}

#[tokio::test]
async fn metrics_route_returns_artifact() {
    let dir = scratch_dir("route-ok");
    let path = dir.join("metrics.json");
    fs::write(&path, SAMPLE_METRICS).expect("write metrics");
    let provider = Arc::new(MetricsProvider::with_candidates(vec![path]));

    let response = model_metrics_router(provider)
        .oneshot(
            Request::get("/api/model/metrics")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["model"]["version"], "rf-v2");
    assert_eq!(payload["kpis"]["accuracy"], 0.87);
    assert_eq!(payload["confusionMatrix"]["matrix"][1][1], 440);
    assert!(payload["rocCurve"].is_array());
    assert!(payload.get("trainingParams").is_none());
}
