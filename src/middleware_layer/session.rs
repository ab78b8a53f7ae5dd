use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Extensions, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result, StoreError},
    models::role::Role,
    repositories::session::bounded,
    state::AppState,
};

/// The name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Who is making the request, resolved once per request by
/// [`require_session`].
///
/// The type itself is the request-extension key: [`require_session`]
/// inserts it, and [`Identity::from_extensions`], the extractor impl and the
/// role gate all read it back by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: i32,
    #[serde(rename = "roleId")]
    pub role: Role,
}

impl Identity {
    /// The identity attached to a request, if the session middleware ran.
    pub fn from_extensions(extensions: &Extensions) -> Option<Identity> {
        extensions.get::<Identity>().copied()
    }

    fn attach(self, extensions: &mut Extensions) {
        extensions.insert(self);
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Identity::from_extensions(&parts.extensions).ok_or_else(|| {
            tracing::error!("❌ Identity requested on a route without session middleware");
            AppError::Internal("identity not resolved".to_string())
        })
    }
}

/// Extracts the session token from the request cookies.
///
/// An empty cookie value counts as no cookie.
pub fn session_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolves a token to the identity of its owner.
///
/// Two bounded lookups: the session, then its user. Either one missing is a
/// not-found rejection; any other store failure propagates unchanged.
pub async fn resolve_identity(state: &AppState, token: &str) -> Result<Identity> {
    let deadline = state.config.store_timeout;

    let session = bounded(deadline, state.sessions.get(token))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => {
                tracing::warn!("❌ Session not found");
                AppError::NotFound("Session not found".to_string())
            }
            other => other.into(),
        })?;

    let user = bounded(deadline, state.users.get(session.user_id))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => {
                tracing::warn!("❌ User {} of a live session not found", session.user_id);
                AppError::NotFound("User not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Identity {
        user_id: user.id,
        role: user.role,
    })
}

/// A middleware that requires a valid session to be present.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The downstream `Response`, or the rejection. The downstream handler is
/// never invoked when resolution fails.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking session...");

    let token = session_token(&cookies).ok_or_else(|| {
        tracing::warn!("❌ No session cookie found");
        AppError::Validation("Missing session cookie".to_string())
    })?;

    let identity = resolve_identity(&state, &token).await?;

    tracing::debug!(
        "✅ User authenticated: {} ({})",
        identity.user_id,
        identity.role
    );

    identity.attach(request.extensions_mut());

    Ok(next.run(request).await)
}
