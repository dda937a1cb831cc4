//! Knowledge base entries that ground the chat assistant.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::info_routes()
}
