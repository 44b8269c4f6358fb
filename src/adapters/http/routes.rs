//! Axum router configuration.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{check_status, create_pay, handle_webhook, health, AppState};

/// Create the payment API router.
///
/// # Routes
/// - `POST /pay` - Create a payment order
/// - `POST /status` - Poll payment status against the provider
/// - `POST /webhook` - Provider callback (no auth, signature verified)
/// - `GET /health` - Liveness and config snapshot
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/pay", post(create_pay))
        .route("/status", post(check_status))
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
}
