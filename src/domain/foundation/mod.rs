//! Foundation value objects shared by every domain module.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{MerchantTransactionId, PaymentId, PlanId, SubscriptionId, UserId};
pub use timestamp::Timestamp;
