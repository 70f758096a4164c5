use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::artifact::{FeatureImportance, ModelMetrics};
use super::provider::MetricsProvider;
use crate::error::AppError;

/// Read-only reporting endpoints over the evaluation artifact.
pub fn model_metrics_router(provider: Arc<MetricsProvider>) -> Router {
    Router::new()
        .route("/api/model/metrics", get(metrics_handler))
        .route("/api/model/feature-importance", get(feature_importance_handler))
        .with_state(provider)
}

pub(crate) async fn metrics_handler(
    State(provider): State<Arc<MetricsProvider>>,
) -> Result<Json<ModelMetrics>, AppError> {
    let metrics = provider.load().await?;
    Ok(Json(metrics))
}

pub(crate) async fn feature_importance_handler(
    State(provider): State<Arc<MetricsProvider>>,
) -> Json<Vec<FeatureImportance>> {
    Json(provider.feature_importance().await)
}
