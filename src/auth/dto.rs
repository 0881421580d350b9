use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::dto::PublicUser;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Exchange a remember token for a fresh access token.
#[derive(Debug, Deserialize)]
pub struct RememberRequest {
    pub user_id: Uuid,
    pub remember_token: String,
}

/// Response returned after login or remember.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_token: Option<String>,
    pub user: PublicUser,
}
