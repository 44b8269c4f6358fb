//! Webhook event envelope and typed entities.

mod errors;
mod event;

pub use errors::WebhookError;
pub use event::{PaymentEntity, SubscriptionEntity, WebhookEvent};
