//! Persistence collaborator. Every graph, feed and user operation receives a
//! `&dyn Store` explicitly; there is no ambient connection.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::microposts::repo_types::Micropost;
use crate::users::repo_types::{CredentialKind, User, UserRecord};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Name of the unique constraint on lowercased email, shared by both adapters.
pub const USERS_EMAIL_KEY: &str = "users_email_lower_key";

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user. A lowercased-email collision is a `ConstraintViolation`.
    async fn insert_user(&self, user: UserRecord) -> ServiceResult<User>;
    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>>;
    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>>;
    async fn set_digest(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        digest: Option<String>,
    ) -> ServiceResult<()>;
    /// Delete the user together with its microposts and every follow edge
    /// touching it. Returns the number of microposts removed.
    async fn delete_user(&self, id: Uuid) -> ServiceResult<u64>;

    async fn insert_micropost(&self, user_id: Uuid, content: &str) -> ServiceResult<Micropost>;
    async fn find_micropost(&self, id: Uuid) -> ServiceResult<Option<Micropost>>;
    async fn delete_micropost(&self, id: Uuid) -> ServiceResult<bool>;
    /// Posts by any of `authors`, newest first. `limit: None` means unbounded.
    async fn microposts_by_authors(
        &self,
        authors: &[Uuid],
        limit: Option<i64>,
        offset: i64,
    ) -> ServiceResult<Vec<Micropost>>;
    async fn count_microposts(&self) -> ServiceResult<i64>;

    /// Idempotent; returns true if a new edge was inserted.
    async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool>;
    /// Idempotent; returns true if an edge was removed.
    async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool>;
    async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool>;
    async fn follower_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>>;
    async fn followed_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>>;
}
