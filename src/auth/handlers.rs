use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RememberRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
    },
    state::AppState,
    users::{repo_types::CredentialKind, services},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/remember", post(remember))
        .route("/auth/session", delete(logout))
}

fn sign(state: &AppState, user_id: uuid::Uuid) -> Result<String, (StatusCode, String)> {
    JwtKeys::from_ref(state).sign_access(user_id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let Some(user) =
        services::authenticate(state.store.as_ref(), &payload.email, &payload.password).await?
    else {
        warn!("login invalid credentials");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    };

    let access_token = sign(&state, user.id)?;
    let remember_token = if payload.remember_me {
        Some(services::remember(state.store.as_ref(), user.id).await?)
    } else {
        None
    };

    info!(user_id = %user.id, remember = payload.remember_me, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        remember_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload), fields(user_id = %payload.user_id))]
pub async fn remember(
    State(state): State<AppState>,
    Json(payload): Json<RememberRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = state
        .store
        .find_user(payload.user_id)
        .await?
        .filter(|u| u.authenticated(CredentialKind::Remember, &payload.remember_token))
        .ok_or_else(|| {
            warn!("remember token rejected");
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        })?;

    let access_token = sign(&state, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        remember_token: None,
        user: user.into(),
    }))
}

/// Clears the remember digest; the short-lived access token simply expires.
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, (StatusCode, String)> {
    services::forget(state.store.as_ref(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
