use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handlers,
    middleware_layer::{role_gate::RoleGate, session::require_session},
    models::role::Role,
    state::AppState,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("⚠️ Ignoring unparseable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400))
}

/// Builds the application's router.
///
/// Public routes sit next to a protected group. Within the protected group
/// the session middleware is the outermost route layer, so every role gate
/// sees the identity it attached.
pub fn build_router(state: AppState) -> Router {
    let denial = state.config.denial_status;

    let public_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route(
            "/logout",
            get(handlers::auth::logout).post(handlers::auth::logout),
        )
        .route("/signup", post(handlers::auth::signup));

    let authenticated_routes = Router::new().route("/me", get(handlers::users::me));

    let seller_routes = RoleGate::new([Role::Seller, Role::Admin])
        .with_denial(denial)
        .guard(Router::new().route(
            "/users/email/{id}",
            get(handlers::users::get_user_email),
        ));

    let admin_routes = RoleGate::new([Role::Admin]).with_denial(denial).guard(
        Router::new()
            .route(
                "/users",
                get(handlers::users::list_users).post(handlers::users::create_user),
            )
            .route(
                "/users/{id}",
                get(handlers::users::get_user).delete(handlers::users::delete_user),
            )
            .route(
                "/sessions/{token}",
                delete(handlers::sessions::revoke_session),
            ),
    );

    let protected_routes = authenticated_routes
        .merge(seller_routes)
        .merge(admin_routes)
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
