use std::collections::HashMap;

use axum::{
    Json,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use cookie::Cookie;
use serde::de::DeserializeOwned;
use tower_sessions::session::{Id, Record};

mod cookie_params;
mod manager;
mod terminate;

pub use cookie_params::CookieParams;
pub use manager::SessionManager;
pub use terminate::{LOGOUT_MESSAGE, SessionTerminator, Termination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Terminated,
}

/// Request-scoped view of a session record.
///
/// A session without an identifier stands for "no session": nothing was
/// presented by the client, or what was presented did not resolve.
#[derive(Debug, Clone)]
pub struct Session {
    id: Option<Id>,
    data: HashMap<String, serde_json::Value>,
    state: SessionState,
}

impl Session {
    pub fn empty() -> Self {
        Self {
            id: None,
            data: HashMap::new(),
            state: SessionState::Active,
        }
    }

    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    fn mark_terminated(&mut self) {
        self.state = SessionState::Terminated;
    }
}

impl From<Record> for Session {
    fn from(record: Record) -> Self {
        Self {
            id: Some(record.id),
            data: record.data,
            state: SessionState::Active,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] tower_sessions::session_store::Error),
    /// The record could not be deleted. The client is still told to drop its
    /// cookie.
    #[error("Failed to destroy session record")]
    Destroy {
        #[source]
        source: tower_sessions::session_store::Error,
        removal_cookie: Option<Cookie<'static>>,
    },
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "Session store failure");

        let set_cookie = match self {
            SessionError::Destroy { removal_cookie, .. } => {
                removal_cookie.map(|cookie| (SET_COOKIE, cookie.to_string()))
            }
            SessionError::Store(_) => None,
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            AppendHeaders(set_cookie),
            Json(serde_json::json!({ "error": "An internal server error occurred" })),
        )
            .into_response()
    }
}
