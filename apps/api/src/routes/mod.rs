pub mod health;
pub mod relay;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upl_chat", post(relay::relay_handler))
        .with_state(state)
}
