use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::store::Store;
use crate::users::repo_types::User;

/// Record `follower -> target`. Idempotent: returns true only when a new edge
/// was created. Self-follow is rejected, and both ends must exist.
#[instrument(skip(store))]
pub async fn follow(store: &dyn Store, follower: Uuid, target: Uuid) -> ServiceResult<bool> {
    if follower == target {
        return Err(ServiceError::SelfFollow);
    }
    for id in [follower, target] {
        if store.find_user(id).await?.is_none() {
            return Err(ServiceError::NotFound("user"));
        }
    }
    let created = store.insert_follow(follower, target).await?;
    if created {
        info!("follow created");
    } else {
        debug!("follow already present");
    }
    Ok(created)
}

/// Remove `follower -> target` if present. Returns true if an edge was removed.
#[instrument(skip(store))]
pub async fn unfollow(store: &dyn Store, follower: Uuid, target: Uuid) -> ServiceResult<bool> {
    let removed = store.delete_follow(follower, target).await?;
    if removed {
        info!("follow removed");
    }
    Ok(removed)
}

pub async fn is_following(store: &dyn Store, follower: Uuid, target: Uuid) -> ServiceResult<bool> {
    store.follow_exists(follower, target).await
}

/// Users with an edge pointing at `user`.
pub async fn followers_of(store: &dyn Store, user: Uuid) -> ServiceResult<Vec<User>> {
    let ids = store.follower_ids(user).await?;
    store.users_by_ids(&ids).await
}

/// Users `user` points at.
pub async fn following_of(store: &dyn Store, user: Uuid) -> ServiceResult<Vec<User>> {
    let ids = store.followed_ids(user).await?;
    store.users_by_ids(&ids).await
}
