use std::sync::Arc;

use anyhow::Context;
use axum::{Router, extract::FromRef};
use cookie::Key;
use fred::{
    clients::Pool,
    interfaces::ClientLike,
    prelude::{Builder, ReconnectPolicy},
};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionStore};
use tower_sessions_redis_store::RedisStore;

use crate::{
    config::{Config, SessionSettings, SessionStoreKind},
    routes::{health_check, logout},
    session::{CookieParams, SessionManager, SessionTerminator},
};

pub struct Application {
    app: Router,
    listener: TcpListener,
    port: u16,
}

pub struct ApiContext {
    pub sessions: SessionManager,
    pub terminator: SessionTerminator,
}

pub type AppRouter = Router<Arc<ApiContext>>;

impl FromRef<Arc<ApiContext>> for SessionManager {
    fn from_ref(api_context: &Arc<ApiContext>) -> Self {
        api_context.sessions.clone()
    }
}

impl Application {
    /// Builds the application with the session store named in `config`.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn SessionStore> = match config.session_settings.session_store {
            SessionStoreKind::Memory => Arc::new(MemoryStore::default()),
            SessionStoreKind::Redis => Arc::new(redis_store(&config.session_settings).await?),
        };

        Self::build_with_store(config, store).await
    }

    pub async fn build_with_store(
        config: Config,
        store: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        let app_env = config.application_settings.app_env;
        let key = signing_key(config.application_settings.hmac_key.as_ref())?;

        let cookie_params = CookieParams::from_settings(&config.session_settings, app_env);
        let sessions = SessionManager::new(
            store,
            cookie_params,
            config.session_settings.session_use_cookies,
            key,
        );
        let terminator = sessions.terminator();

        let api_context = ApiContext {
            sessions,
            terminator,
        };

        let app = api_router()
            .with_state(Arc::new(api_context))
            .layer(TraceLayer::new_for_http());

        let address = format!(
            "{}:{}",
            config.application_settings.app_host, config.application_settings.app_port
        );
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        let port = listener
            .local_addr()
            .context("Failed to read bound address")?
            .port();

        tracing::info!(%address, port, ?app_env, "Application built");

        Ok(Self {
            app,
            listener,
            port,
        })
    }

    pub async fn run(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.app).await
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn api_router() -> AppRouter {
    Router::new()
        .merge(health_check::router())
        .merge(logout::router())
}

fn signing_key(hmac_key: Option<&SecretString>) -> anyhow::Result<Key> {
    match hmac_key {
        Some(hmac_key) => Key::try_from(hmac_key.expose_secret().as_bytes())
            .context("HMAC key must be at least 64 bytes long"),
        None => {
            tracing::warn!("No HMAC key configured, session cookies will not survive a restart");
            Ok(Key::generate())
        }
    }
}

async fn redis_store(settings: &SessionSettings) -> anyhow::Result<RedisStore<Pool>> {
    let redis_url = settings
        .redis_url
        .as_ref()
        .context("The redis session store requires a redis url")?;

    let redis_config = fred::prelude::Config::from_url(redis_url.expose_secret())
        .context("Failed to configure redis client")?;

    let redis_pool = Builder::from_config(redis_config)
        .with_connection_config(|redis_config| {
            redis_config.connection_timeout = std::time::Duration::from_secs(10);
        })
        // use exponential backoff, starting at 100 ms and doubling on each failed attempt up to 30 sec
        .set_policy(ReconnectPolicy::new_exponential(0, 100, 30_000, 2))
        .build_pool(8)
        .context("Failed to create redis pool")?;

    redis_pool
        .init()
        .await
        .context("Failed to connect to redis")?;

    Ok(RedisStore::new(redis_pool))
}
