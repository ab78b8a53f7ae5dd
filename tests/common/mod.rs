//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use storefront_auth::{
    AppState, Config, build_router,
    models::{
        role::Role,
        user::{NewUser, User},
    },
};

/// Create a test application over fresh in-memory stores.
pub fn test_app_with(config: Config) -> (Router, AppState) {
    let state = AppState::in_memory(config);
    (build_router(state.clone()), state)
}

/// Create a test application with the default configuration.
pub fn test_app() -> (Router, AppState) {
    test_app_with(Config::default())
}

/// Insert a user directly into the directory.
pub async fn seed_user(state: &AppState, email: &str, password: &str, role: Role) -> User {
    let credential = state.credentials.protect(password).unwrap();
    state
        .users
        .create(NewUser {
            email: email.to_string(),
            credential,
            role,
        })
        .await
        .unwrap()
}

/// A response reduced to what the tests look at.
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// The token carried by a `session=` Set-Cookie header.
    pub fn session_token(&self) -> Option<String> {
        let cookie = self.set_cookie.as_deref()?;
        let pair = cookie.split(';').next()?.trim();
        pair.strip_prefix("session=").map(String::from)
    }
}

/// Send one request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(app, request).await
}

/// Send a prepared request through the router.
pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        set_cookie,
        body,
    }
}

/// Log in and return the session token from the cookie.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
    response.session_token().expect("login set no session cookie")
}
