use std::sync::Arc;

use axum::{
    Json,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use cookie::{Cookie, time::OffsetDateTime};
use tower_sessions::SessionStore;

use crate::session::{CookieParams, Session, SessionError, SessionState};

pub const LOGOUT_MESSAGE: &str = "Logout successful";

#[derive(serde::Serialize)]
struct LogoutBody {
    message: &'static str,
}

/// Ends sessions: wipes their data, expires the client cookie and deletes
/// the stored record.
#[derive(Clone)]
pub struct SessionTerminator {
    store: Arc<dyn SessionStore>,
    // None when the session identifier is not carried in a cookie
    cookie_params: Option<CookieParams>,
}

impl SessionTerminator {
    pub fn new(store: Arc<dyn SessionStore>, cookie_params: Option<CookieParams>) -> Self {
        Self {
            store,
            cookie_params,
        }
    }

    pub fn cookie_params(&self) -> Option<&CookieParams> {
        self.cookie_params.as_ref()
    }

    /// Terminates `session`.
    ///
    /// Data is cleared before the record is deleted, so it is unreadable for
    /// the rest of the request even if the store fails. A session without an
    /// identifier, or one already terminated, only gets its data cleared and
    /// the removal cookie issued.
    #[tracing::instrument(name = "Terminate session", skip_all, fields(session_id))]
    pub async fn terminate(&self, session: &mut Session) -> Result<Termination, SessionError> {
        session.clear();

        let removal_cookie = self
            .cookie_params
            .as_ref()
            .map(|params| params.removal_cookie(OffsetDateTime::now_utc()));

        if let (Some(session_id), SessionState::Active) = (session.id(), session.state()) {
            tracing::Span::current().record("session_id", tracing::field::display(session_id));
            if let Err(source) = self.store.delete(&session_id).await {
                return Err(SessionError::Destroy {
                    source,
                    removal_cookie,
                });
            }
            tracing::info!("Session record destroyed");
        }
        session.mark_terminated();

        Ok(Termination { removal_cookie })
    }
}

/// Outcome of a termination, rendered as the logout response.
#[derive(Debug)]
pub struct Termination {
    removal_cookie: Option<Cookie<'static>>,
}

impl Termination {
    pub fn removal_cookie(&self) -> Option<&Cookie<'static>> {
        self.removal_cookie.as_ref()
    }
}

impl IntoResponse for Termination {
    fn into_response(self) -> Response {
        let set_cookie = self
            .removal_cookie
            .map(|cookie| (SET_COOKIE, cookie.to_string()));

        (
            StatusCode::OK,
            AppendHeaders(set_cookie),
            Json(LogoutBody {
                message: LOGOUT_MESSAGE,
            }),
        )
            .into_response()
    }
}
