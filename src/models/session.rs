use serde::{Deserialize, Serialize};

/// Represents a user session.
///
/// A session has no expiry; it lives until logout or administrative
/// deletion removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The opaque token carried in the `session` cookie.
    pub token: String,
    /// The ID of the user this session belongs to.
    pub user_id: i32,
}
