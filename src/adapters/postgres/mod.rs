//! PostgreSQL adapters for the persistence ports.

mod order_store;
mod subscription_store;

pub use order_store::PostgresOrderStore;
pub use subscription_store::PostgresSubscriptionStore;
