use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    microposts::{
        dto::{CreateMicropostRequest, MicropostResponse, Pagination},
        repo_types::Micropost,
        services,
    },
    state::AppState,
};

impl From<Micropost> for MicropostResponse {
    fn from(p: Micropost) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            content: p.content,
            created_at: p.created_at,
        }
    }
}

pub fn micropost_routes() -> Router<AppState> {
    Router::new()
        .route("/microposts", post(create_micropost))
        .route("/microposts/:id", delete(delete_micropost))
        .route("/feed", get(feed))
}

#[instrument(skip(state, body))]
pub async fn create_micropost(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateMicropostRequest>,
) -> Result<(StatusCode, Json<MicropostResponse>), (StatusCode, String)> {
    let post = services::create_micropost(state.store.as_ref(), user_id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[instrument(skip(state))]
pub async fn delete_micropost(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_micropost(state.store.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MicropostResponse>>, (StatusCode, String)> {
    let posts = services::feed_page(state.store.as_ref(), user_id, p).await?;
    Ok(Json(posts.into_iter().map(MicropostResponse::from).collect()))
}
