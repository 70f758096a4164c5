use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use churn_engine::model_metrics::{model_metrics_router, MetricsProvider};
use churn_engine::prediction::{prediction_router, PredictionEngine};
use churn_engine::sessions::{session_router, SessionStore};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_service_routes<S>(
    engine: Arc<PredictionEngine>,
    metrics: Arc<MetricsProvider>,
    sessions: Arc<S>,
) -> Router
where
    S: SessionStore + 'static,
{
    prediction_router(engine)
        .merge(model_metrics_router(metrics))
        .merge(session_router(sessions))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySessionStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        };
        let missing_metrics = std::env::temp_dir().join("churn-api-no-metrics.json");

        with_service_routes(
            Arc::new(PredictionEngine::rules()),
            Arc::new(MetricsProvider::with_candidates(vec![missing_metrics])),
            Arc::new(InMemorySessionStore::default()),
        )
        .layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn readiness_reflects_startup_state() {
        let response = app(false).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await, json!({ "status": "initializing" }));

        let response = app(true).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let response = app(true).oneshot(get("/metrics")).await.expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn merged_routes_cover_prediction_and_sessions() {
        let router = app(true);

        let response = router
            .clone()
            .oneshot(get("/api/health"))
            .await
            .expect("route executes");
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));

        let response = router
            .clone()
            .oneshot(
                Request::put("/api/sessions/s-1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"messages":[]}"#))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(get("/api/sessions/s-1"))
            .await
            .expect("route executes");
        assert_eq!(json_body(response).await, json!({ "messages": [] }));
    }

    #[tokio::test]
    async fn predict_route_validates_through_service_router() {
        let response = app(true)
            .oneshot(
                Request::post("/api/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["status"], 400);
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .starts_with("age: age is required"));
    }
}
