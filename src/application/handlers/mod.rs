//! Use-case handlers. Each orchestrates exactly one operation across the
//! ports; domain rules stay in the domain layer.

mod check_status;
mod create_order;
mod process_webhook;

pub use check_status::{CheckStatusError, CheckStatusHandler, StatusReport};
pub use create_order::{CreateOrderError, CreateOrderHandler, CreateOrderResult};
pub use process_webhook::{ProcessWebhookError, ProcessWebhookHandler, WebhookOutcome};
