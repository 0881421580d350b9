use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser, social::services, state::AppState, users::dto::PublicUser,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowResponse {
    pub followed_id: Uuid,
    pub following: bool,
}

pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/follow", post(follow).delete(unfollow))
        .route("/users/:id/followers", get(followers))
        .route("/users/:id/following", get(following))
}

#[instrument(skip(state))]
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<Uuid>,
) -> Result<(StatusCode, Json<FollowResponse>), (StatusCode, String)> {
    let created = services::follow(state.store.as_ref(), user_id, target).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(FollowResponse {
            followed_id: target,
            following: true,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<Uuid>,
) -> Result<Json<FollowResponse>, (StatusCode, String)> {
    services::unfollow(state.store.as_ref(), user_id, target).await?;
    Ok(Json(FollowResponse {
        followed_id: target,
        following: false,
    }))
}

#[instrument(skip(state))]
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = services::followers_of(state.store.as_ref(), id).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = services::following_of(state.store.as_ref(), id).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
