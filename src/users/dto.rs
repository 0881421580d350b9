use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::User;

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedUserResponse {
    pub id: Uuid,
    pub microposts_removed: u64,
}
