use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use super::domain::{Contract, InternetService, PredictionResult};
use super::engine::PredictionEngine;
use super::validation::PredictRequest;
use crate::error::AppError;

/// Enumerations a client needs to build a valid request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataView {
    pub contract_options: Vec<&'static str>,
    pub internet_service_options: Vec<&'static str>,
}

impl MetadataView {
    pub fn current() -> Self {
        Self {
            contract_options: Contract::ALL.iter().map(|c| c.label()).collect(),
            internet_service_options: InternetService::ALL.iter().map(|s| s.label()).collect(),
        }
    }
}

/// Router builder exposing health, metadata, and scoring endpoints.
pub fn prediction_router(engine: Arc<PredictionEngine>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/metadata", get(metadata_handler))
        .route("/api/predict", post(predict_handler))
        .with_state(engine)
}

pub(crate) async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn metadata_handler() -> Json<MetadataView> {
    Json(MetadataView::current())
}

pub(crate) async fn predict_handler(
    State(engine): State<Arc<PredictionEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    let Json(body) = payload?;
    let request = PredictRequest::try_from(body)?;
    let result = engine.predict(request).await?;
    Ok(Json(result))
}
