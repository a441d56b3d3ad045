use std::{collections::HashMap, sync::Arc};

use axum::extract::{FromRef, FromRequestParts, Query};
use cookie::{Cookie, CookieJar, Key};
use http::{HeaderMap, header::COOKIE, request::Parts};
use tower_sessions::{SessionStore, session::Id};

use crate::session::{CookieParams, Session, SessionError, SessionTerminator};

/// Resolves the session presented by a request against the session store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie_params: CookieParams,
    use_cookies: bool,
    key: Key,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        cookie_params: CookieParams,
        use_cookies: bool,
        key: Key,
    ) -> Self {
        Self {
            store,
            cookie_params,
            use_cookies,
            key,
        }
    }

    pub fn terminator(&self) -> SessionTerminator {
        let cookie_params = self.use_cookies.then(|| self.cookie_params.clone());
        SessionTerminator::new(self.store.clone(), cookie_params)
    }

    /// Identifier carried by the request, if any.
    ///
    /// Cookie transport only accepts cookies carrying a valid signature.
    /// Without cookies the identifier is read from the query parameter named
    /// after the session.
    pub fn session_id(&self, parts: &Parts) -> Option<Id> {
        let raw_id = if self.use_cookies {
            self.signed_cookie_value(&parts.headers)
        } else {
            Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(mut params)| params.remove(&self.cookie_params.name))
        };

        match raw_id?.parse::<Id>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::debug!("Ignoring malformed session identifier");
                None
            }
        }
    }

    #[tracing::instrument(name = "Load session", skip_all, fields(session_id))]
    pub async fn load(&self, parts: &Parts) -> Result<Session, SessionError> {
        let Some(session_id) = self.session_id(parts) else {
            return Ok(Session::empty());
        };
        tracing::Span::current().record("session_id", tracing::field::display(session_id));

        match self.store.load(&session_id).await? {
            Some(record) => Ok(Session::from(record)),
            None => {
                tracing::debug!("No live session record for identifier");
                Ok(Session::empty())
            }
        }
    }

    fn signed_cookie_value(&self, headers: &HeaderMap) -> Option<String> {
        let mut jar = CookieJar::new();
        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(header.to_owned()).flatten() {
                jar.add_original(cookie.into_owned());
            }
        }

        let cookie = jar.signed(&self.key).get(&self.cookie_params.name);
        if cookie.is_none() && jar.get(&self.cookie_params.name).is_some() {
            tracing::warn!("Session cookie failed signature verification");
        }
        cookie.map(|cookie| cookie.value().to_owned())
    }
}

impl<S> FromRequestParts<S> for Session
where
    SessionManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionManager::from_ref(state).load(parts).await
    }
}
