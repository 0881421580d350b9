use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::Store;
use crate::error::{ServiceError, ServiceResult};
use crate::microposts::repo_types::Micropost;
use crate::users::repo_types::{CredentialKind, User, UserRecord};

const USER_COLUMNS: &str = "id, name, email, password_digest, remember_digest, created_at";

/// Postgres-backed store. Uniqueness and cascades are enforced by the schema in
/// `migrations/` plus explicit transactional deletes.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: UserRecord) -> ServiceResult<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_digest)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password_digest)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY name, id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_digest(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        digest: Option<String>,
    ) -> ServiceResult<()> {
        let sql = match kind {
            CredentialKind::Password => "UPDATE users SET password_digest = $2 WHERE id = $1",
            CredentialKind::Remember => "UPDATE users SET remember_digest = $2 WHERE id = $1",
        };
        let affected = sqlx::query(sql)
            .bind(user_id)
            .bind(digest)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(ServiceError::NotFound("user"));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<u64> {
        let mut tx = self.pool.begin().await?;

        let posts = sqlx::query("DELETE FROM microposts WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM relationships WHERE follower_id = $1 OR followed_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let users = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if users == 0 {
            tx.rollback().await?;
            return Err(ServiceError::NotFound("user"));
        }

        tx.commit().await?;
        debug!(user_id = %id, posts, "user deleted with dependents");
        Ok(posts)
    }

    async fn insert_micropost(&self, user_id: Uuid, content: &str) -> ServiceResult<Micropost> {
        let row = sqlx::query_as::<_, Micropost>(
            r#"
            INSERT INTO microposts (id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_micropost(&self, id: Uuid) -> ServiceResult<Option<Micropost>> {
        let row = sqlx::query_as::<_, Micropost>(
            "SELECT id, user_id, content, created_at FROM microposts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_micropost(&self, id: Uuid) -> ServiceResult<bool> {
        let affected = sqlx::query("DELETE FROM microposts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn microposts_by_authors(
        &self,
        authors: &[Uuid],
        limit: Option<i64>,
        offset: i64,
    ) -> ServiceResult<Vec<Micropost>> {
        // LIMIT NULL is LIMIT ALL in Postgres.
        let rows = sqlx::query_as::<_, Micropost>(
            r#"
            SELECT id, user_id, content, created_at
            FROM microposts
            WHERE user_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(authors)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_microposts(&self) -> ServiceResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM microposts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO relationships (follower_id, followed_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            RETURNING follower_id
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let affected = sqlx::query(
            "DELETE FROM relationships WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM relationships WHERE follower_id = $1 AND followed_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn follower_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT follower_id FROM relationships WHERE followed_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn followed_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT followed_id FROM relationships WHERE follower_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
