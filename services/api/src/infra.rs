use churn_engine::sessions::{SessionError, SessionId, SessionStore};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local session store; contents are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Value>>>,
}

fn poisoned() -> SessionError {
    SessionError::Unavailable("session store lock poisoned".to_string())
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &SessionId) -> Result<Option<Value>, SessionError> {
        let guard = self.sessions.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    fn put(&self, id: SessionId, session: Value) -> Result<(), SessionError> {
        let mut guard = self.sessions.write().map_err(|_| poisoned())?;
        guard.insert(id, session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_overwrites_previous_session() {
        let store = InMemorySessionStore::default();
        let id = SessionId("abc".to_string());

        store.put(id.clone(), json!({ "step": 1 })).expect("put");
        store.put(id.clone(), json!({ "step": 2 })).expect("put");

        assert_eq!(store.get(&id).expect("get"), Some(json!({ "step": 2 })));
    }

    #[test]
    fn unknown_session_is_absent() {
        let store = InMemorySessionStore::default();
        assert_eq!(
            store.get(&SessionId("missing".to_string())).expect("get"),
            None
        );
    }

    #[test]
    fn clones_share_storage() {
        let store = InMemorySessionStore::default();
        let handle = store.clone();

        handle
            .put(SessionId("shared".to_string()), json!({}))
            .expect("put");

        assert_eq!(
            store.get(&SessionId("shared".to_string())).expect("get"),
            Some(json!({}))
        );
    }
}
