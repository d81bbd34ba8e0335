// libs/reception-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{self, ReceptionState};

/// Webhook routes for the voice agent's tools. Every route answers POST with
/// a speakable JSON envelope; `/invoke/{operation}` is the name-dispatched
/// variant of the same seven operations.
pub fn reception_routes(state: Arc<ReceptionState>) -> Router {
    Router::new()
        .route("/pre-check-patient", post(handlers::pre_check_patient))
        .route("/verify-patient", post(handlers::verify_patient))
        .route("/check-availability", post(handlers::check_availability))
        .route("/book-appointment", post(handlers::book_appointment))
        .route("/process-spelled-name", post(handlers::process_spelled_name))
        .route("/search-patients", post(handlers::search_patients))
        .route("/cancel-appointment", post(handlers::cancel_appointment))
        .route("/invoke/{operation}", post(handlers::invoke_operation))
        .with_state(state)
}
