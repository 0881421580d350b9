use crate::state::AppState;
use axum::Router;

pub mod credentials;
pub mod dto;
pub mod handlers;
pub mod repo_types;
pub mod services;
pub mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .merge(handlers::me_routes())
}
