use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::role::Role,
};

/// The request payload for login.
#[derive(Deserialize, Validate, Debug)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The request payload for signup and administrative user creation.
#[derive(Deserialize, Validate, Debug)]
pub struct NewUserRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
    #[serde(rename = "roleId")]
    #[garde(skip)]
    pub role_id: i32,
}

impl NewUserRequest {
    /// The requested role, rejected when the id names no role.
    pub fn role(&self) -> Result<Role> {
        Role::try_from(self.role_id).map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// Unwraps a JSON body and validates it.
///
/// Body rejections and validation reports both become
/// [`AppError::Validation`], so they render through the envelope like every
/// other failure.
pub fn validated<T: Validate<Context = ()>>(
    payload: std::result::Result<Json<T>, JsonRejection>,
) -> Result<T> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    body.validate()
        .map_err(|report| AppError::Validation(report.to_string()))?;
    Ok(body)
}

/// Unwraps a path parameter, turning a malformed one into
/// [`AppError::Validation`].
pub fn path_param<T>(param: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    let Path(value) = param.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(value)
}
