use axum::http::StatusCode;
use tracing::{debug, info};

use super::domain::{FeatureRecord, PredictionResult};
use super::error::PredictionError;
use super::process::ProcessScorer;
use super::rules::RuleScorer;
use super::validation::{PredictRequest, ValidationErrors};
use crate::config::{ScorerConfig, ScorerKind};

/// The interchangeable scoring strategies, chosen once at startup.
#[derive(Debug, Clone)]
pub enum Scorer {
    Rules(RuleScorer),
    Process(ProcessScorer),
}

impl Scorer {
    pub fn from_config(config: &ScorerConfig) -> Self {
        match config.kind {
            ScorerKind::Rules => Scorer::Rules(RuleScorer::new()),
            ScorerKind::Process => Scorer::Process(ProcessScorer::new(config.process.clone())),
        }
    }

    pub fn kind(&self) -> ScorerKind {
        match self {
            Scorer::Rules(_) => ScorerKind::Rules,
            Scorer::Process(_) => ScorerKind::Process,
        }
    }

    pub async fn score(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        match self {
            Scorer::Rules(scorer) => Ok(scorer.score(record)),
            Scorer::Process(scorer) => scorer.score(record).await,
        }
    }
}

/// Error raised by [`PredictionEngine::predict`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl EngineError {
    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Prediction(err) => err.status(),
        }
    }
}

/// Facade that validates requests and hands records to the configured scorer. Holds no state
/// besides the scorer and never retries or falls back to another scorer.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    scorer: Scorer,
}

impl PredictionEngine {
    pub fn new(scorer: Scorer) -> Self {
        Self { scorer }
    }

    pub fn from_config(config: &ScorerConfig) -> Self {
        let engine = Self::new(Scorer::from_config(config));
        match &engine.scorer {
            Scorer::Rules(_) => info!(scorer = "rules", "prediction engine ready"),
            Scorer::Process(scorer) => info!(
                scorer = "process",
                program = %scorer.config().program,
                timeout_secs = scorer.config().timeout.as_secs(),
                "prediction engine ready"
            ),
        }
        engine
    }

    pub fn rules() -> Self {
        Self::new(Scorer::Rules(RuleScorer::new()))
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.kind().label()
    }

    pub async fn predict(&self, request: PredictRequest) -> Result<PredictionResult, EngineError> {
        let record = FeatureRecord::try_from(request)?;
        let result = self.score(&record).await?;
        Ok(result)
    }

    pub async fn score(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        let result = self.scorer.score(record).await?;
        debug!(
            scorer = self.scorer_name(),
            label = %result.label,
            score = result.score,
            "scored customer record"
        );
        Ok(result)
    }
}
