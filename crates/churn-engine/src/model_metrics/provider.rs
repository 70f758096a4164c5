use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::artifact::{FeatureImportance, ModelMetrics};

/// Locations tried after the configured path, relative to the working directory.
pub const FALLBACK_METRICS_PATHS: [&str; 2] =
    ["backend/models/metrics.json", "models/metrics.json"];

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("model metrics file not found (searched {searched}); run training first")]
    NotFound { searched: String },
    #[error("failed to read model metrics from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model metrics file {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only access to the evaluation artifact. The file is re-read on every call so a
/// retrained model shows up without a restart.
#[derive(Debug, Clone)]
pub struct MetricsProvider {
    candidates: Vec<PathBuf>,
}

impl MetricsProvider {
    pub fn new(configured: impl Into<PathBuf>) -> Self {
        let mut candidates = vec![configured.into()];
        candidates.extend(FALLBACK_METRICS_PATHS.iter().map(PathBuf::from));
        Self::with_candidates(candidates)
    }

    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists as a regular file.
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }

    pub async fn load(&self) -> Result<ModelMetrics, MetricsError> {
        let path = self.resolve().ok_or_else(|| MetricsError::NotFound {
            searched: self
                .candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

        debug!(path = %path.display(), "loading model metrics");
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MetricsError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&raw).map_err(|source| MetricsError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Never fails: a missing or broken artifact yields an empty ranking.
    pub async fn feature_importance(&self) -> Vec<FeatureImportance> {
        match self.load().await {
            Ok(metrics) => metrics.feature_importance,
            Err(err) => {
                warn!(error = %err, "feature importance unavailable");
                Vec::new()
            }
        }
    }
}
