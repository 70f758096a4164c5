//! Side-loaded model evaluation metrics (accuracy, ROC curve, confusion matrix, feature
//! importances). Consumed by the reporting endpoints only; scoring never reads them.

mod artifact;
mod provider;
mod router;

#[cfg(test)]
mod tests;

pub use artifact::{ConfusionMatrix, FeatureImportance, Kpis, ModelInfo, ModelMetrics, RocPoint};
pub use provider::{MetricsError, MetricsProvider, FALLBACK_METRICS_PATHS};
pub use router::model_metrics_router;
