//! Churn prediction: the validated feature record, the two interchangeable scorers, and the
//! engine facade that the HTTP layer calls.

pub mod domain;
mod engine;
mod error;
pub mod process;
pub mod router;
pub mod rules;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ChurnLabel, Contract, ExplanationItem, FeatureRecord, InternetService, InvalidChoice,
    PredictionResult, CHURN_THRESHOLD,
};
pub use engine::{EngineError, PredictionEngine, Scorer};
pub use error::{PredictionError, PredictionErrorKind};
pub use process::ProcessScorer;
pub use router::{prediction_router, MetadataView};
pub use rules::RuleScorer;
pub use validation::{FieldViolation, PredictRequest, ValidationErrors};
