use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionStore};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use churn_engine::config::AppConfig;
use churn_engine::error::AppError;
use churn_engine::model_metrics::MetricsProvider;
use churn_engine::prediction::PredictionEngine;
use churn_engine::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(kind) = args.scorer.take() {
        config.scorer.kind = kind;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = Arc::new(PredictionEngine::from_config(&config.scorer));
    let metrics = Arc::new(MetricsProvider::new(&config.metrics.metrics_path));
    let sessions = Arc::new(InMemorySessionStore::default());

    let app = with_service_routes(engine, metrics, sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        scorer = config.scorer.kind.label(),
        "churn prediction service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
