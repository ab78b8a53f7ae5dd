//! Login, logout and session middleware through the full router.

use axum::http::{Method, StatusCode};
use serde_json::json;
use storefront_auth::{
    error::StoreError,
    models::role::Role,
    repositories::session::SessionStore as _,
};

mod common;
use common::{login, seed_user, send, test_app};

#[tokio::test]
async fn test_login_sets_cookie_and_stores_session() {
    let (app, state) = test_app();
    let user = seed_user(&state, "a@x.com", "pw1", Role::Customer).await;

    let response = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], "Success");
    assert_eq!(response.body["error"], "");

    let cookie = response.set_cookie.clone().unwrap();
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Max-Age"));

    let token = response.session_token().unwrap();
    assert_eq!(token.len(), 32);
    let session = state.sessions.get(&token).await.unwrap();
    assert_eq!(session.user_id, user.id);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized_without_cookie() {
    let (app, state) = test_app();
    seed_user(&state, "a@x.com", "pw1", Role::Customer).await;

    let response = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "nope" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie.is_none());
    assert!(response.body["data"].is_null());
    assert_eq!(response.body["error"], "invalid password");
}

#[tokio::test]
async fn test_login_bad_requests() {
    let (app, state) = test_app();
    seed_user(&state, "a@x.com", "pw1", Role::Customer).await;

    let bodies = [
        json!({ "email": "ghost@x.com", "password": "pw1" }),
        json!({ "email": "not-an-email", "password": "pw1" }),
        json!({ "email": "a@x.com" }),
        json!("just a string"),
    ];

    for body in bodies {
        let response = send(&app, Method::POST, "/login", None, Some(body.clone())).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response.set_cookie.is_none());
        assert!(response.body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }
}

#[tokio::test]
async fn test_logout_succeeds_once_then_not_found() {
    let (app, state) = test_app();
    seed_user(&state, "a@x.com", "pw1", Role::Customer).await;
    let token = login(&app, "a@x.com", "pw1").await;

    let first = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"], "Logged out");
    let removal = first.set_cookie.unwrap();
    assert!(removal.starts_with("session="));
    assert!(removal.contains("Max-Age=0"));
    assert!(removal.contains("Path=/"));
    assert!(matches!(
        state.sessions.get(&token).await,
        Err(StoreError::NotFound)
    ));

    let second = send(&app, Method::GET, "/logout", Some(&token), None).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.body["error"], "Session not found");
}

#[tokio::test]
async fn test_logout_without_cookie_is_bad_request() {
    let (app, _) = test_app();
    let response = send(&app, Method::POST, "/logout", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_reports_resolved_identity() {
    let (app, state) = test_app();
    let user = seed_user(&state, "s@x.com", "secret", Role::Seller).await;
    let token = login(&app, "s@x.com", "secret").await;

    let response = send(&app, Method::GET, "/me", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["userId"], user.id);
    assert_eq!(response.body["data"]["roleId"], 2);
    assert_eq!(response.body["data"]["email"], "s@x.com");
}

#[tokio::test]
async fn test_protected_route_rejections() {
    let (app, _) = test_app();

    let missing = send(&app, Method::GET, "/me", None, None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let unknown = send(&app, Method::GET, "/me", Some("NoSuchSessionToken"), None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "Session not found");
}

#[tokio::test]
async fn test_each_login_opens_a_distinct_session() {
    let (app, state) = test_app();
    seed_user(&state, "a@x.com", "pw1", Role::Customer).await;

    let first = login(&app, "a@x.com", "pw1").await;
    let second = login(&app, "a@x.com", "pw1").await;
    assert_ne!(first, second);

    let logout = send(&app, Method::POST, "/logout", Some(&first), None).await;
    assert_eq!(logout.status, StatusCode::OK);

    let still_in = send(&app, Method::GET, "/me", Some(&second), None).await;
    assert_eq!(still_in.status, StatusCode::OK);
}
