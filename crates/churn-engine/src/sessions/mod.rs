//! Opaque key/value persistence for client conversation state.
//!
//! Stores are last-writer-wins with no expiry and no eviction; the prediction path never
//! touches them.

mod router;


use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use router::session_router;

/// Client-chosen session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage abstraction so the HTTP layer can be exercised without a concrete backend.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &SessionId) -> Result<Option<Value>, SessionError>;
    fn put(&self, id: SessionId, session: Value) -> Result<(), SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session payload must be a JSON object")]
    InvalidPayload,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::InvalidPayload => StatusCode::BAD_REQUEST,
            SessionError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
