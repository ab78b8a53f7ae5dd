use serde::Serialize;

use crate::models::role::Role;

/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: i32,
    /// The user's email address, unique across users.
    pub email: String,
    /// The stored credential, in whatever form the credential scheme keeps it.
    pub credential: String,
    /// The user's role.
    pub role: Role,
}

/// The fields needed to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub credential: String,
    pub role: Role,
}

/// The public view of a user. Never carries the credential.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub role_id: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role_id: user.role,
        }
    }
}
