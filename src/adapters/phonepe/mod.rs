//! PhonePe gateway adapters: real client, deterministic mock, and the
//! fallback wrapper that bridges them.

mod client;
mod fallback;
mod mock;
mod types;

pub use client::PhonePeClient;
pub use fallback::FallbackGatewayClient;
pub use mock::MockGatewayClient;
