use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    error::Result,
    middleware_layer::session::Identity,
    models::user::UserView,
    response::write_json,
    services::users as user_service,
    state::AppState,
    validation::auth::{NewUserRequest, path_param, validated},
};

/// The caller's own identity and email.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub identity: Identity,
    pub email: String,
}

/// Returns the identity the session middleware resolved.
#[axum::debug_handler]
pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Response> {
    let user = user_service::get(&state, identity.user_id).await?;

    Ok(write_json(
        StatusCode::OK,
        MeResponse {
            identity,
            email: user.email,
        },
    ))
}

/// Lists every user.
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Response> {
    let users = user_service::list(&state).await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();

    tracing::debug!("All {} users were received", views.len());
    Ok(write_json(StatusCode::OK, views))
}

/// Creates a user with any role.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    payload: std::result::Result<Json<NewUserRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = validated(payload)?;
    let user = user_service::register(&state, payload).await?;

    tracing::info!("👤 User {} created by admin {}", user.id, identity.user_id);
    Ok(write_json(StatusCode::CREATED, UserView::from(&user)))
}

/// Returns one user.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Response> {
    let user = user_service::get(&state, path_param(user_id)?).await?;
    Ok(write_json(StatusCode::OK, UserView::from(&user)))
}

/// Returns one user's email address.
#[axum::debug_handler]
pub async fn get_user_email(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Response> {
    let user = user_service::get(&state, path_param(user_id)?).await?;
    Ok(write_json(StatusCode::OK, user.email))
}

/// Deletes one user.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    user_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Response> {
    let user_id = path_param(user_id)?;
    user_service::remove(&state, user_id).await?;

    tracing::info!("🗑️ User {} deleted by admin {}", user_id, identity.user_id);
    Ok(StatusCode::NO_CONTENT.into_response())
}
