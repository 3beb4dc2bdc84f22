use crate::state::AppState;
use axum::Router;

pub mod activity;
mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::admin_routes())
}
