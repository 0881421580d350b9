use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    state::AppState,
    users::{
        dto::{DeletedUserResponse, PublicUser},
        repo_types::NewUser,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(sign_up))
        .route("/users/:id", get(get_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = services::sign_up(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = services::find(state.store.as_ref(), id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = services::find(state.store.as_ref(), user_id)
        .await
        .map_err(|_| (StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DeletedUserResponse>, (StatusCode, String)> {
    let microposts_removed = services::delete_user(state.store.as_ref(), user_id).await?;
    Ok(Json(DeletedUserResponse {
        id: user_id,
        microposts_removed,
    }))
}
