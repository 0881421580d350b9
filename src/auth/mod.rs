use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
