//! Churn risk scoring service core.
//!
//! A validated [`prediction::FeatureRecord`] is scored either by the in-process
//! [`prediction::RuleScorer`] or by an external program through [`prediction::ProcessScorer`];
//! [`prediction::PredictionEngine`] picks one at startup. Model metrics, session storage and
//! CSV batch scoring sit alongside as collaborators of the HTTP surface.

pub mod batch;
pub mod config;
pub mod error;
pub mod model_metrics;
pub mod prediction;
pub mod sessions;
pub mod telemetry;
