use axum::{
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    error::Result,
    middleware_layer::session::Identity,
    services::auth as auth_service,
    state::AppState,
    validation::auth::path_param,
};

/// Administrative deletion of any session by token.
#[axum::debug_handler]
pub async fn revoke_session(
    State(state): State<AppState>,
    identity: Identity,
    token: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let token = path_param(token)?;
    auth_service::revoke(&state, &token).await?;

    tracing::info!("🗑️ Session revoked by admin {}", identity.user_id);
    Ok(StatusCode::NO_CONTENT.into_response())
}
