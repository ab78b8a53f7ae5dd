//! Cookie-session authentication and role gating for an axum service.
//!
//! A request to a protected route passes through
//! [`require_session`](middleware_layer::session::require_session), which
//! resolves the `session` cookie to an [`Identity`](middleware_layer::session::Identity),
//! and then through any [`RoleGate`](middleware_layer::role_gate::RoleGate)
//! mounted on the route.

pub mod config;
pub mod db;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod credentials;
    pub mod token;
}

pub mod models {
    pub mod role;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod session;
    pub mod session_redis;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod users;
}

pub mod handlers {
    pub mod auth;
    pub mod sessions;
    pub mod users;
}

pub mod middleware_layer {
    pub mod role_gate;
    pub mod session;
}

pub mod validation {
    pub mod auth;
}

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
