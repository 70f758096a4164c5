//! End-to-end behavior of the churn engine through its public facade, batch pipeline, and HTTP
//! routers.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use churn_engine::batch::{read_requests, score_all, write_results};
use churn_engine::model_metrics::{model_metrics_router, MetricsProvider};
use churn_engine::prediction::{
    prediction_router, ChurnLabel, EngineError, PredictRequest, PredictionEngine,
};

fn request(
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

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn service_router(engine: PredictionEngine, provider: MetricsProvider) -> Router {
    Router::new()
        .merge(prediction_router(Arc::new(engine)))
        .merge(model_metrics_router(Arc::new(provider)))
}

#[tokio::test]
async fn rule_engine_scores_reference_customers() {
    let engine = PredictionEngine::rules();

    let late_payer = engine
        .predict(request(40, 60, 70.0, "Two year", "DSL", 50))
        .await
        .expect("valid request");
    assert_eq!(late_payer.label, ChurnLabel::Churn);
    assert!((late_payer.score - 0.5167).abs() < 1e-4);

    let loyal = engine
        .predict(request(50, 100, 50.0, "Two year", "DSL", 0))
        .await
        .expect("valid request");
    assert_eq!(loyal.label, ChurnLabel::NoChurn);
    assert!((loyal.score - 0.0333).abs() < 1e-4);
    assert_eq!(loyal.votes, 0);
}

#[tokio::test]
async fn engine_reports_every_invalid_field() {
    let engine = PredictionEngine::rules();
    let mut input = request(-5, 12, 80.0, "Quarterly", "DSL", 0);
    input.payment_delay = None;

    match engine.predict(input).await {
        Err(EngineError::Validation(errors)) => {
            let fields: Vec<&str> = errors.fields().collect();
            assert_eq!(fields, vec!["age", "contract", "paymentDelay"]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn batch_pipeline_scores_and_writes_csv() {
    let csv = "\
age,tenure,monthlyCharges,contract,internetService,paymentDelay
30,12,80.0,Month-to-month,Fiber optic,20
50,100,50.0,Two year,DSL,0
40,60,70.0,Two year,Satellite,0
";
    let inputs = read_requests(csv.as_bytes()).expect("csv parses");
    let report = score_all(Arc::new(PredictionEngine::rules()), inputs, 2).await;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.churn, 1);
    assert_eq!(report.summary.no_churn, 1);
    assert_eq!(report.summary.failed, 1);

    let mut output = Vec::new();
    write_results(&mut output, &report.rows).expect("csv writes");
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("internetService must be one of: DSL, Fiber optic, None"));
}

#[tokio::test]
async fn merged_routers_serve_prediction_and_missing_metrics() {
    let missing = std::env::temp_dir().join(format!(
        "churn-engine-it-{}-absent.json",
        std::process::id()
    ));
    let router = service_router(
        PredictionEngine::rules(),
        MetricsProvider::with_candidates(vec![missing]),
    );

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "age": 30,
                        "tenure": 12,
                        "monthlyCharges": 80.0,
                        "contract": "Month-to-month",
                        "internetService": "Fiber optic",
                        "paymentDelay": 20
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["label"], "CHURN");

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/model/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["status"], 500);

    let response = router
        .oneshot(
            Request::get("/api/model/feature-importance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}
