use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,              // always stored lowercase
    #[serde(skip_serializing)]
    pub password_digest: String,    // Argon2 PHC string
    #[serde(skip_serializing)]
    pub remember_digest: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Signup draft, before normalization and hashing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Row handed to the store once the draft has been validated.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub password_digest: String,
}

/// Which stored digest a raw token is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    Remember,
}

impl User {
    pub fn digest(&self, kind: CredentialKind) -> Option<&str> {
        match kind {
            CredentialKind::Password => Some(self.password_digest.as_str()),
            CredentialKind::Remember => self.remember_digest.as_deref(),
        }
    }
}
