use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::{SessionError, SessionId, SessionStore};
use crate::error::AppError;

pub fn session_router<S>(store: Arc<S>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route(
            "/api/sessions/:session_id",
            get(get_session_handler::<S>).put(put_session_handler::<S>),
        )
        .with_state(store)
}

pub(crate) async fn get_session_handler<S>(
    State(store): State<Arc<S>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError>
where
    S: SessionStore + 'static,
{
    let id = SessionId(session_id);
    match store.get(&id)? {
        Some(session) => Ok(Json(session)),
        None => Err(SessionError::NotFound(id).into()),
    }
}

pub(crate) async fn put_session_handler<S>(
    State(store): State<Arc<S>>,
    Path(session_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError>
where
    S: SessionStore + 'static,
{
    let Json(session) = payload?;
    if !session.is_object() {
        return Err(SessionError::InvalidPayload.into());
    }

    store.put(SessionId(session_id), session.clone())?;
    Ok(Json(session))
}
