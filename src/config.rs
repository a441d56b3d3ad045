use clap_derive::ValueEnum;
use secrecy::SecretString;

#[derive(clap::Parser, Debug)]
pub struct Config {
    /// Application settings
    #[clap(flatten)]
    pub application_settings: ApplicationSettings,
    /// Session store and session cookie settings
    #[clap(flatten)]
    pub session_settings: SessionSettings,
}

#[derive(clap::Parser, Debug)]
pub struct ApplicationSettings {
    /// Application environment
    #[clap(long, env, default_value = "development")]
    pub app_env: AppEnv,
    /// Application host
    #[clap(long, env, default_value = "127.0.0.1")]
    pub app_host: String,
    /// Application port
    #[clap(long, env, default_value_t = 8000)]
    pub app_port: u16,
    /// HMAC key for signing and verification of session cookies, at least 64 bytes
    #[clap(long, env)]
    pub hmac_key: Option<SecretString>,
}

#[derive(clap::Parser, Debug)]
pub struct SessionSettings {
    /// Backend holding the session records
    #[clap(long, env, default_value = "memory")]
    pub session_store: SessionStoreKind,
    /// Redis url, required by the redis session store
    #[clap(long, env)]
    pub redis_url: Option<SecretString>,
    /// Name of the session, used as the cookie name or query parameter
    #[clap(long, env, default_value = "SESSID")]
    pub session_name: String,
    /// Carry the session identifier in a cookie
    #[clap(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub session_use_cookies: bool,
    #[clap(long, env, default_value = "/")]
    pub session_cookie_path: String,
    #[clap(long, env)]
    pub session_cookie_domain: Option<String>,
    /// Defaults to true outside of development
    #[clap(long, env, action = clap::ArgAction::Set)]
    pub session_cookie_secure: Option<bool>,
    #[clap(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub session_cookie_http_only: bool,
    #[clap(long, env)]
    pub session_cookie_same_site: Option<SameSitePolicy>,
}

impl SessionSettings {
    pub fn cookie_secure(&self, app_env: AppEnv) -> bool {
        self.session_cookie_secure
            .unwrap_or(app_env == AppEnv::Production || app_env == AppEnv::Staging)
    }
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq)]
pub enum AppEnv {
    #[clap(name = "development")]
    Development,
    #[clap(name = "staging")]
    Staging,
    #[clap(name = "production")]
    Production,
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq)]
pub enum SessionStoreKind {
    #[clap(name = "memory")]
    Memory,
    #[clap(name = "redis")]
    Redis,
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq)]
pub enum SameSitePolicy {
    #[clap(name = "lax")]
    Lax,
    #[clap(name = "strict")]
    Strict,
    #[clap(name = "none")]
    None,
}

impl From<SameSitePolicy> for cookie::SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Lax => cookie::SameSite::Lax,
            SameSitePolicy::Strict => cookie::SameSite::Strict,
            SameSitePolicy::None => cookie::SameSite::None,
        }
    }
}
