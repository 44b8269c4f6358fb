//! In-memory adapters backing tests and local development.

mod order_store;
mod subscription_store;

pub use order_store::InMemoryOrderStore;
pub use subscription_store::InMemorySubscriptionStore;
