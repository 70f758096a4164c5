use std::io;

use axum::http::StatusCode;
use serde::Serialize;

/// Failure classes a scorer can report. Each call fails with exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionErrorKind {
    Timeout,
    ExternalRejection,
    MalformedResponse,
    IoFailure,
    Interrupted,
}

impl PredictionErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            PredictionErrorKind::Timeout => "timeout",
            PredictionErrorKind::ExternalRejection => "external_rejection",
            PredictionErrorKind::MalformedResponse => "malformed_response",
            PredictionErrorKind::IoFailure => "io_failure",
            PredictionErrorKind::Interrupted => "interrupted",
        }
    }

    /// Only an explicit rejection from the external scorer is the caller's fault.
    pub const fn status(self) -> StatusCode {
        match self {
            PredictionErrorKind::ExternalRejection => StatusCode::BAD_REQUEST,
            PredictionErrorKind::Timeout
            | PredictionErrorKind::MalformedResponse
            | PredictionErrorKind::IoFailure
            | PredictionErrorKind::Interrupted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PredictionError {
    kind: PredictionErrorKind,
    message: String,
}

impl PredictionError {
    pub fn new(kind: PredictionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(PredictionErrorKind::Timeout, "Prediction timed out.")
    }

    pub fn interrupted() -> Self {
        Self::new(PredictionErrorKind::Interrupted, "Prediction interrupted.")
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(PredictionErrorKind::ExternalRejection, message)
    }

    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self::new(
            PredictionErrorKind::MalformedResponse,
            format!("Prediction failed: malformed scorer response ({detail})"),
        )
    }

    /// Classifies an I/O failure; interrupted system calls are reported as interruptions.
    pub fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            return Self::interrupted();
        }
        Self::new(
            PredictionErrorKind::IoFailure,
            format!("Prediction failed: {err}"),
        )
    }

    pub fn kind(&self) -> PredictionErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl From<io::Error> for PredictionError {
    fn from(err: io::Error) -> Self {
        Self::from_io(err)
    }
}
