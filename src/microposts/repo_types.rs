use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Micropost record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Micropost {
    pub id: Uuid,
    pub user_id: Uuid, // author, cascade-deleted with the user
    pub content: String,
    pub created_at: OffsetDateTime,
}
