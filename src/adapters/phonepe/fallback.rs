//! Fallback wrapper around the real gateway.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::payment::Payment;
use crate::ports::{GatewayClient, GatewayError, OrderReceipt, ProviderStatus};

/// Tries the primary gateway first; on a transient failure retries the
/// order once against the fallback (the mock). A `Rejected` answer is a
/// real decision by the provider and never falls back.
pub struct FallbackGatewayClient {
    primary: Arc<dyn GatewayClient>,
    fallback: Arc<dyn GatewayClient>,
}

impl FallbackGatewayClient {
    pub fn new(primary: Arc<dyn GatewayClient>, fallback: Arc<dyn GatewayClient>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl GatewayClient for FallbackGatewayClient {
    async fn create_order(&self, payment: &Payment) -> Result<OrderReceipt, GatewayError> {
        match self.primary.create_order(payment).await {
            Ok(receipt) => Ok(receipt),
            Err(GatewayError::Unavailable(reason)) => {
                tracing::warn!(
                    merchant_transaction_id = %payment.merchant_transaction_id,
                    %reason,
                    "primary gateway unavailable, falling back to mock"
                );
                self.fallback.create_order(payment).await
            }
            Err(err) => Err(err),
        }
    }

    /// Status checks never fall back: a mock status would fabricate a
    /// terminal state for a real order.
    async fn check_status(&self, payment: &Payment) -> Result<ProviderStatus, GatewayError> {
        self.primary.check_status(payment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::phonepe::MockGatewayClient;
    use crate::domain::foundation::{PlanId, Timestamp, UserId};
    use crate::domain::payment::{Amount, BillingCycle, PaymentDraft};

    struct UnavailableGateway;

    #[async_trait]
    impl GatewayClient for UnavailableGateway {
        async fn create_order(&self, _: &Payment) -> Result<OrderReceipt, GatewayError> {
            Err(GatewayError::Unavailable("connection refused".to_string()))
        }

        async fn check_status(&self, _: &Payment) -> Result<ProviderStatus, GatewayError> {
            Err(GatewayError::Unavailable("connection refused".to_string()))
        }
    }

    struct RejectingGateway;

    #[async_trait]
    impl GatewayClient for RejectingGateway {
        async fn create_order(&self, _: &Payment) -> Result<OrderReceipt, GatewayError> {
            Err(GatewayError::Rejected {
                code: "KEY_NOT_CONFIGURED".to_string(),
                message: "bad merchant".to_string(),
            })
        }

        async fn check_status(&self, _: &Payment) -> Result<ProviderStatus, GatewayError> {
            unreachable!()
        }
    }

    fn payment() -> Payment {
        Payment::from_draft(
            PaymentDraft {
                user_id: UserId::new("user-1").unwrap(),
                plan_id: PlanId::new("premium").unwrap(),
                billing_cycle: BillingCycle::Monthly,
                amount: Amount::from_minor_units(49_900).unwrap(),
            },
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn unavailable_primary_falls_back_to_mock() {
        let client = FallbackGatewayClient::new(
            Arc::new(UnavailableGateway),
            Arc::new(MockGatewayClient::new()),
        );
        let receipt = client.create_order(&payment()).await.unwrap();
        assert!(receipt.via_mock);
    }

    #[tokio::test]
    async fn rejection_never_falls_back() {
        let client = FallbackGatewayClient::new(
            Arc::new(RejectingGateway),
            Arc::new(MockGatewayClient::new()),
        );
        assert!(matches!(
            client.create_order(&payment()).await,
            Err(GatewayError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn status_check_does_not_fall_back() {
        let client = FallbackGatewayClient::new(
            Arc::new(UnavailableGateway),
            Arc::new(MockGatewayClient::new()),
        );
        assert!(matches!(
            client.check_status(&payment()).await,
            Err(GatewayError::Unavailable(_))
        ));
    }
}
