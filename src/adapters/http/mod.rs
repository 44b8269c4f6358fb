//! HTTP surface: axum routes, handlers, and wire DTOs.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, HealthSnapshot};
pub use routes::payment_routes;
