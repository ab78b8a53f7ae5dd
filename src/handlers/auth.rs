use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    error::{AppError, Result},
    middleware_layer::session::{SESSION_COOKIE, session_token},
    models::{role::Role, user::UserView},
    response::write_json,
    services::{auth as auth_service, users as user_service},
    state::AppState,
    validation::auth::{LoginRequest, NewUserRequest, validated},
};

/// Creates the session cookie.
///
/// No `Max-Age`: the cookie lasts for the browser session, matching the
/// server-side session which has no expiry of its own.
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");

    cookie
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = validated(payload)?;
    tracing::info!("🔐 Login attempt for: {}", payload.email);

    let token = auth_service::login(&state, &payload.email, &payload.password).await?;

    cookies.add(session_cookie(token, state.config.secure_cookies));
    tracing::debug!("✅ Session cookie added");

    Ok(write_json(StatusCode::OK, "Success"))
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let token = session_token(&cookies).ok_or_else(|| {
        tracing::warn!("❌ Logout without a session cookie");
        AppError::Validation("Missing session cookie".to_string())
    })?;

    auth_service::logout(&state, &token).await?;

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    cookies.remove(removal);

    Ok(write_json(StatusCode::OK, "Logged out"))
}

/// Handles self-service registration.
///
/// Open to anyone, so it refuses to create administrators.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewUserRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = validated(payload)?;

    if payload.role()? == Role::Admin {
        return Err(AppError::Validation(
            "Admin accounts can only be created by an admin".to_string(),
        ));
    }

    let user = user_service::register(&state, payload).await?;

    Ok(write_json(StatusCode::CREATED, UserView::from(&user)))
}
