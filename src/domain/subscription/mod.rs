//! Subscription aggregate and lifecycle service.

mod lifecycle;
mod subscription;

pub use lifecycle::SubscriptionLifecycle;
pub use subscription::{Subscription, SubscriptionStatus};
