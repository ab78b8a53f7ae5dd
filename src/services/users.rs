use crate::{
    error::{AppError, Result, StoreError},
    models::user::{NewUser, User},
    repositories::session::bounded,
    state::AppState,
    validation::auth::NewUserRequest,
};

fn user_not_found(e: StoreError) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound("User not found".to_string()),
        other => other.into(),
    }
}

/// Creates a user, storing the credential through the active scheme.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The validated request; its role must already be checked by
///   the caller when the route restricts roles.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn register(state: &AppState, request: NewUserRequest) -> Result<User> {
    let role = request.role()?;
    let credential = state.credentials.protect(&request.password)?;

    let user = bounded(
        state.config.store_timeout,
        state.users.create(NewUser {
            email: request.email,
            credential,
            role,
        }),
    )
    .await
    .map_err(|e| match e {
        StoreError::Conflict => AppError::Conflict("Already exists".to_string()),
        other => other.into(),
    })?;

    tracing::info!("✅ User created with ID: {} ({})", user.id, user.role);
    Ok(user)
}

/// Lists every user.
pub async fn list(state: &AppState) -> Result<Vec<User>> {
    Ok(bounded(state.config.store_timeout, state.users.list()).await?)
}

/// Finds one user.
pub async fn get(state: &AppState, user_id: i32) -> Result<User> {
    bounded(state.config.store_timeout, state.users.get(user_id))
        .await
        .map_err(user_not_found)
}

/// Deletes one user together with their sessions.
pub async fn remove(state: &AppState, user_id: i32) -> Result<()> {
    let deadline = state.config.store_timeout;

    bounded(deadline, state.users.delete(user_id))
        .await
        .map_err(user_not_found)?;

    let ended = bounded(deadline, state.sessions.delete_for_user(user_id)).await?;

    tracing::info!("🗑️ User {} was deleted with {} session(s)", user_id, ended);
    Ok(())
}
