use serde::{Deserialize, Serialize};

/// Evaluation report written next to a trained model. Every section is optional so partially
/// populated artifacts still render; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelMetrics {
    pub model: Option<ModelInfo>,
    pub kpis: Option<Kpis>,
    pub confusion_matrix: Option<ConfusionMatrix>,
    pub roc_curve: Vec<RocPoint>,
    pub feature_importance: Vec<FeatureImportance>,
}

/// Identity and provenance of the trained artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub last_trained_at: Option<String>,
    pub last_evaluated_at: Option<String>,
    pub dataset: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Kpis {
    pub accuracy: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub churn_rate: f64,
    pub samples: u64,
}

/// Row-major counts; `labels` names both axes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
