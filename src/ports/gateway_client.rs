//! Outbound port for the payment gateway.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::payment::Payment;

/// Acknowledgement of a created order.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    /// URL the user must be redirected to in order to pay.
    pub redirect_url: String,
    /// Provider-side transaction id, when the provider reports one at
    /// creation time.
    pub provider_transaction_id: Option<String>,
    /// True when the order was served by the mock gateway.
    pub via_mock: bool,
    /// Raw provider response body, stored for reconciliation.
    pub raw_response: serde_json::Value,
}

/// Provider-reported state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Completed,
    Failed,
    Pending,
}

#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub state: ProviderState,
    pub provider_transaction_id: Option<String>,
    pub response_code: Option<String>,
    pub raw_response: serde_json::Value,
}

/// Errors an order creation or status check can surface.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider understood the request and said no. Not retryable.
    #[error("gateway rejected the request: {code}: {message}")]
    Rejected { code: String, message: String },

    /// Network failure, timeout, or a 5xx. Retryable; the payment stays
    /// pending.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a body we could not make sense of.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// Client for creating orders and polling status at the provider.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Submits a payment order and returns the redirect the user needs.
    async fn create_order(&self, payment: &Payment) -> Result<OrderReceipt, GatewayError>;

    /// Polls the provider for the current state of a transaction.
    async fn check_status(&self, payment: &Payment) -> Result<ProviderStatus, GatewayError>;
}
