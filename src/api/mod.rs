pub mod auth;
pub mod downloads;
pub mod middleware;

pub use auth::callback_routes;
pub use downloads::download_routes;

use crate::services::{LibraryExporter, TokenExchange};
use axum::Router;
use std::sync::Arc;

pub struct AppState {
    pub tokens: Arc<TokenExchange>,
    pub exporter: Arc<LibraryExporter>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(callback_routes())
                .merge(download_routes()),
        )
        .with_state(state)
}
