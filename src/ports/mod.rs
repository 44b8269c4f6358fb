//! Ports: trait boundaries between the domain and the outside world.

mod clock;
mod gateway_client;
mod order_store;
mod subscription_store;

pub use clock::{Clock, SystemClock};
pub use gateway_client::{GatewayClient, GatewayError, OrderReceipt, ProviderState, ProviderStatus};
pub use order_store::{OrderStore, StoreError, TransitionFields};
pub use subscription_store::SubscriptionStore;

pub use clock::test_support;
