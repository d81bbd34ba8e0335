use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use reception_cell::handlers::ReceptionState;
use reception_cell::router::reception_routes;

pub fn create_router(state: Arc<ReceptionState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Frontdesk API is running!" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api/tools", reception_routes(state))
}
