use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, USERS_EMAIL_KEY};
use crate::error::{ServiceError, ServiceResult};
use crate::microposts::repo_types::Micropost;
use crate::users::repo_types::{CredentialKind, User, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // insertion order doubles as creation order
    microposts: Vec<Micropost>,
    // (follower_id, followed_id), in insertion order
    relationships: Vec<(Uuid, Uuid)>,
}

/// In-process store with the same uniqueness and cascade rules as the
/// Postgres schema. Used by tests and by local runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> ServiceResult<User> {
        let mut t = self.tables.lock().await;
        let email = user.email.to_lowercase();
        if t.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(ServiceError::ConstraintViolation {
                constraint: USERS_EMAIL_KEY.into(),
            });
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_digest: user.password_digest,
            remember_digest: None,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let email = email.to_lowercase();
        let t = self.tables.lock().await;
        Ok(t.users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        let t = self.tables.lock().await;
        let wanted: BTreeSet<Uuid> = ids.iter().copied().collect();
        let mut rows: Vec<User> = wanted
            .iter()
            .filter_map(|id| t.users.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn set_digest(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        digest: Option<String>,
    ) -> ServiceResult<()> {
        let mut t = self.tables.lock().await;
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or(ServiceError::NotFound("user"))?;
        match kind {
            CredentialKind::Password => {
                user.password_digest = digest.ok_or_else(|| {
                    ServiceError::Internal("password digest cannot be cleared".into())
                })?;
            }
            CredentialKind::Remember => user.remember_digest = digest,
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<u64> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&id) {
            return Err(ServiceError::NotFound("user"));
        }
        let before = t.microposts.len();
        t.microposts.retain(|p| p.user_id != id);
        let removed = (before - t.microposts.len()) as u64;
        t.relationships
            .retain(|(follower, followed)| *follower != id && *followed != id);
        t.users.remove(&id);
        Ok(removed)
    }

    async fn insert_micropost(&self, user_id: Uuid, content: &str) -> ServiceResult<Micropost> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&user_id) {
            return Err(ServiceError::NotFound("user"));
        }
        let row = Micropost {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.microposts.push(row.clone());
        Ok(row)
    }

    async fn find_micropost(&self, id: Uuid) -> ServiceResult<Option<Micropost>> {
        let t = self.tables.lock().await;
        Ok(t.microposts.iter().find(|p| p.id == id).cloned())
    }

    async fn delete_micropost(&self, id: Uuid) -> ServiceResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.microposts.len();
        t.microposts.retain(|p| p.id != id);
        Ok(t.microposts.len() < before)
    }

    async fn microposts_by_authors(
        &self,
        authors: &[Uuid],
        limit: Option<i64>,
        offset: i64,
    ) -> ServiceResult<Vec<Micropost>> {
        let t = self.tables.lock().await;
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = limit
            .map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(t.microposts
            .iter()
            .rev()
            .filter(|p| authors.contains(&p.user_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_microposts(&self) -> ServiceResult<i64> {
        Ok(self.tables.lock().await.microposts.len() as i64)
    }

    async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&follower_id) || !t.users.contains_key(&followed_id) {
            return Err(ServiceError::NotFound("user"));
        }
        let edge = (follower_id, followed_id);
        if t.relationships.contains(&edge) {
            return Ok(false);
        }
        t.relationships.push(edge);
        Ok(true)
    }

    async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.relationships.len();
        t.relationships
            .retain(|edge| *edge != (follower_id, followed_id));
        Ok(t.relationships.len() < before)
    }

    async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid) -> ServiceResult<bool> {
        let t = self.tables.lock().await;
        Ok(t.relationships.contains(&(follower_id, followed_id)))
    }

    async fn follower_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let t = self.tables.lock().await;
        Ok(t.relationships
            .iter()
            .filter(|(_, followed)| *followed == user_id)
            .map(|(follower, _)| *follower)
            .collect())
    }

    async fn followed_ids(&self, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let t = self.tables.lock().await;
        Ok(t.relationships
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, followed)| *followed)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str) -> UserRecord {
        UserRecord {
            name: "Example User".into(),
            email: email.into(),
            password_digest: "digest".into(),
        }
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        store.insert_user(record("dup@example.com")).await.unwrap();
        let err = store
            .insert_user(record("DUP@EXAMPLE.COM"))
            .await
            .unwrap_err();
        match err {
            ServiceError::ConstraintViolation { constraint } => {
                assert_eq!(constraint, USERS_EMAIL_KEY)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_user_removes_posts_and_edges() {
        let store = MemoryStore::new();
        let a = store.insert_user(record("a@example.com")).await.unwrap();
        let b = store.insert_user(record("b@example.com")).await.unwrap();
        store.insert_micropost(a.id, "one").await.unwrap();
        store.insert_micropost(a.id, "two").await.unwrap();
        store.insert_micropost(b.id, "three").await.unwrap();
        store.insert_follow(a.id, b.id).await.unwrap();
        store.insert_follow(b.id, a.id).await.unwrap();

        assert_eq!(store.delete_user(a.id).await.unwrap(), 2);
        assert_eq!(store.count_microposts().await.unwrap(), 1);
        assert!(store.follower_ids(b.id).await.unwrap().is_empty());
        assert!(store.followed_ids(b.id).await.unwrap().is_empty());
        assert!(store.find_user(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("user")));
    }

    #[tokio::test]
    async fn follow_edges_are_unique_per_pair() {
        let store = MemoryStore::new();
        let a = store.insert_user(record("a@example.com")).await.unwrap();
        let b = store.insert_user(record("b@example.com")).await.unwrap();
        assert!(store.insert_follow(a.id, b.id).await.unwrap());
        assert!(!store.insert_follow(a.id, b.id).await.unwrap());
        assert_eq!(store.followed_ids(a.id).await.unwrap(), vec![b.id]);
        assert!(store.delete_follow(a.id, b.id).await.unwrap());
        assert!(!store.delete_follow(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn microposts_window_newest_first() {
        let store = MemoryStore::new();
        let a = store.insert_user(record("a@example.com")).await.unwrap();
        for n in 0..5 {
            store.insert_micropost(a.id, &format!("post {n}")).await.unwrap();
        }
        let page = store
            .microposts_by_authors(&[a.id], Some(2), 1)
            .await
            .unwrap();
        let contents: Vec<&str> = page.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["post 3", "post 2"]);
    }
}
