use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_PAGE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateMicropostRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MicropostResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamp client-supplied values into `1..=MAX_PAGE` and a non-negative offset.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_PAGE),
            offset: self.offset.max(0),
        }
    }
}
