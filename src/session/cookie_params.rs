use std::borrow::Cow;

use cookie::{
    Cookie, SameSite,
    time::{Duration, OffsetDateTime},
};

use crate::config::{AppEnv, SessionSettings};

// How far in the past the removal cookie's expiry is set.
const REMOVAL_EXPIRY_OFFSET: Duration = Duration::seconds(42_000);

/// Scoping attributes of the session cookie.
///
/// A client only replaces a cookie whose name, path and domain match, so the
/// removal cookie must be built from the same parameters the session cookie
/// was issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieParams {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieParams {
    pub fn from_settings(settings: &SessionSettings, app_env: AppEnv) -> Self {
        Self {
            name: settings.session_name.clone(),
            path: settings.session_cookie_path.clone(),
            domain: settings
                .session_cookie_domain
                .clone()
                .filter(|domain| !domain.trim().is_empty()),
            secure: settings.cookie_secure(app_env),
            http_only: settings.session_cookie_http_only,
            same_site: settings.session_cookie_same_site.map(SameSite::from),
        }
    }

    /// A cookie named and scoped like the session cookie.
    pub fn scoped_cookie<V>(&self, value: V) -> Cookie<'static>
    where
        V: Into<Cow<'static, str>>,
    {
        let mut builder = Cookie::build((self.name.clone(), value))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }

        builder.build()
    }

    /// Instruction for the client to drop its session cookie.
    pub fn removal_cookie(&self, now: OffsetDateTime) -> Cookie<'static> {
        let mut cookie = self.scoped_cookie("");
        cookie.set_expires(now - REMOVAL_EXPIRY_OFFSET);
        cookie
    }
}
