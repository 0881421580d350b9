use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::microposts::{dto::Pagination, repo_types::Micropost};
use crate::store::Store;
use crate::users::validation::check_content;

#[instrument(skip(store, content))]
pub async fn create_micropost(
    store: &dyn Store,
    author: Uuid,
    content: &str,
) -> ServiceResult<Micropost> {
    let content = content.trim();
    if let Some(err) = check_content(content) {
        warn!(%err, "micropost rejected");
        return Err(ServiceError::Invalid(vec![err]));
    }
    if store.find_user(author).await?.is_none() {
        return Err(ServiceError::NotFound("user"));
    }
    let post = store.insert_micropost(author, content).await?;
    info!(micropost_id = %post.id, "micropost created");
    Ok(post)
}

/// Only the author may delete a post.
#[instrument(skip(store))]
pub async fn delete_micropost(store: &dyn Store, author: Uuid, id: Uuid) -> ServiceResult<()> {
    let post = store
        .find_micropost(id)
        .await?
        .ok_or(ServiceError::NotFound("micropost"))?;
    if post.user_id != author {
        return Err(ServiceError::Forbidden);
    }
    store.delete_micropost(id).await?;
    Ok(())
}

/// Everything `user` should see: their own posts plus posts by everyone they
/// follow, newest first.
pub async fn feed(store: &dyn Store, user: Uuid) -> ServiceResult<Vec<Micropost>> {
    collect_feed(store, user, None, 0).await
}

pub async fn feed_page(
    store: &dyn Store,
    user: Uuid,
    page: Pagination,
) -> ServiceResult<Vec<Micropost>> {
    let page = page.clamped();
    collect_feed(store, user, Some(page.limit), page.offset).await
}

#[instrument(skip(store))]
async fn collect_feed(
    store: &dyn Store,
    user: Uuid,
    limit: Option<i64>,
    offset: i64,
) -> ServiceResult<Vec<Micropost>> {
    let mut authors = store.followed_ids(user).await?;
    if !authors.contains(&user) {
        authors.push(user);
    }
    let posts = store.microposts_by_authors(&authors, limit, offset).await?;
    debug!(authors = authors.len(), posts = posts.len(), "feed built");
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::services::{follow, tests::seed_user, unfollow};
    use crate::store::MemoryStore;
    use crate::users::validation::{Field, FieldErrorKind};

    #[tokio::test]
    async fn feed_has_the_right_posts() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let archer = seed_user(&store, "Archer").await;
        let lana = seed_user(&store, "Lana").await;
        follow(&store, aron.id, lana.id).await.unwrap();

        let followed_post = create_micropost(&store, lana.id, "from lana").await.unwrap();
        let own_post = create_micropost(&store, aron.id, "from aron").await.unwrap();
        let unfollowed_post = create_micropost(&store, archer.id, "from archer")
            .await
            .unwrap();

        let posts = feed(&store, aron.id).await.unwrap();
        assert!(posts.contains(&followed_post));
        assert!(posts.contains(&own_post));
        assert!(!posts.contains(&unfollowed_post));
    }

    #[tokio::test]
    async fn followers_posts_stay_out_of_the_feed() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let archer = seed_user(&store, "Archer").await;
        follow(&store, archer.id, aron.id).await.unwrap();
        let post = create_micropost(&store, archer.id, "hello").await.unwrap();

        assert!(!feed(&store, aron.id).await.unwrap().contains(&post));
        assert!(feed(&store, archer.id).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn unfollowing_drops_posts_from_feed() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let lana = seed_user(&store, "Lana").await;
        follow(&store, aron.id, lana.id).await.unwrap();
        let post = create_micropost(&store, lana.id, "hi").await.unwrap();
        assert!(feed(&store, aron.id).await.unwrap().contains(&post));

        unfollow(&store, aron.id, lana.id).await.unwrap();
        assert!(feed(&store, aron.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_is_newest_first_and_pages() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let lana = seed_user(&store, "Lana").await;
        follow(&store, aron.id, lana.id).await.unwrap();
        for n in 0..3 {
            create_micropost(&store, aron.id, &format!("aron {n}")).await.unwrap();
            create_micropost(&store, lana.id, &format!("lana {n}")).await.unwrap();
        }

        let all = feed(&store, aron.id).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].content, "lana 2");

        let page = feed_page(&store, aron.id, Pagination { limit: 2, offset: 2 })
            .await
            .unwrap();
        let contents: Vec<&str> = page.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["lana 1", "aron 1"]);
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let err = create_micropost(&store, aron.id, "   ").await.unwrap_err();
        match err {
            ServiceError::Invalid(errors) => {
                assert_eq!(errors[0].field, Field::Content);
                assert_eq!(errors[0].kind, FieldErrorKind::Blank);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count_microposts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn padded_content_is_measured_trimmed() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let body = "a".repeat(140);
        let post = create_micropost(&store, aron.id, &format!("  {body}  "))
            .await
            .unwrap();
        assert_eq!(post.content, body);

        let err = create_micropost(&store, aron.id, &format!(" {body}a "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[tokio::test]
    async fn deleted_author_cannot_post() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        store.delete_user(aron.id).await.unwrap();

        let err = create_micropost(&store, aron.id, "ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("user")));
        assert_eq!(store.count_microposts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let store = MemoryStore::new();
        let aron = seed_user(&store, "Aron").await;
        let archer = seed_user(&store, "Archer").await;
        let post = create_micropost(&store, aron.id, "mine").await.unwrap();

        let err = delete_micropost(&store, archer.id, post.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
        delete_micropost(&store, aron.id, post.id).await.unwrap();
        assert_eq!(store.count_microposts().await.unwrap(), 0);
    }
}
