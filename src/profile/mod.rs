use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod score;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::profile_routes())
}
