use std::sync::Arc;

use axum::{Router, extract::State, routing::get};

use crate::{
    app::{ApiContext, AppRouter},
    session::{Session, SessionError, Termination},
};

pub fn router() -> AppRouter {
    Router::new().route("/logout", get(logout).post(logout))
}

#[tracing::instrument(name = "Logging out", skip_all)]
async fn logout(
    State(api_context): State<Arc<ApiContext>>,
    mut session: Session,
) -> Result<Termination, SessionError> {
    api_context.terminator.terminate(&mut session).await
}
