use axum::{Router, http::StatusCode, routing::get};

use crate::app::AppRouter;

pub fn router() -> AppRouter {
    Router::new().route("/health_check", get(health_check))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
