//! The uniform JSON envelope every endpoint answers with.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    data: &'a T,
    error: &'a str,
}

/// Renders `{"data": <data>, "error": <error>}`.
///
/// Unit data renders as `null`.
pub fn envelope_body<T: Serialize>(data: &T, error: &str) -> String {
    sonic_rs::to_string(&Envelope { data, error })
        .unwrap_or_else(|_| r#"{"data":null,"error":"Internal server error"}"#.to_string())
}

/// A successful response carrying `data` and an empty error message.
pub fn write_json<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        envelope_body(&data, ""),
    )
        .into_response()
}
