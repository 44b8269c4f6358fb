//! Deterministic mock gateway.
//!
//! Stands in for the provider during development and tests, and serves
//! as the fallback target when the real provider is unreachable. Every
//! receipt and status it produces is tagged `via_mock`.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::payment::Payment;
use crate::ports::{GatewayClient, GatewayError, OrderReceipt, ProviderState, ProviderStatus};

pub struct MockGatewayClient {
    redirect_base: String,
    status_outcome: ProviderState,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self {
            redirect_base: "https://mock.wellpay.local/pay".to_string(),
            status_outcome: ProviderState::Completed,
        }
    }

    /// Fixes the state every status check reports.
    pub fn with_status_outcome(mut self, outcome: ProviderState) -> Self {
        self.status_outcome = outcome;
        self
    }
}

impl Default for MockGatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn create_order(&self, payment: &Payment) -> Result<OrderReceipt, GatewayError> {
        let mtid = payment.merchant_transaction_id.to_string();
        Ok(OrderReceipt {
            redirect_url: format!("{}/{}", self.redirect_base, mtid),
            provider_transaction_id: Some(format!("TMOCK{mtid}")),
            via_mock: true,
            raw_response: json!({
                "success": true,
                "code": "PAYMENT_INITIATED",
                "mock": true,
                "data": { "merchantTransactionId": mtid },
            }),
        })
    }

    async fn check_status(&self, payment: &Payment) -> Result<ProviderStatus, GatewayError> {
        let mtid = payment.merchant_transaction_id.to_string();
        let (state, code) = match self.status_outcome {
            ProviderState::Completed => ("COMPLETED", "PAYMENT_SUCCESS"),
            ProviderState::Failed => ("FAILED", "PAYMENT_ERROR"),
            ProviderState::Pending => ("PENDING", "PAYMENT_PENDING"),
        };
        Ok(ProviderStatus {
            state: self.status_outcome,
            provider_transaction_id: Some(format!("TMOCK{mtid}")),
            response_code: Some(code.to_string()),
            raw_response: json!({
                "success": true,
                "code": code,
                "mock": true,
                "data": { "merchantTransactionId": mtid, "state": state },
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::foundation::{PlanId, Timestamp, UserId};
    use crate::domain::payment::{Amount, BillingCycle, PaymentDraft};

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
    async fn receipts_are_tagged_via_mock() {
        let payment = payment();
        let receipt = MockGatewayClient::new().create_order(&payment).await.unwrap();
        assert!(receipt.via_mock);
        assert!(receipt
            .redirect_url
            .ends_with(payment.merchant_transaction_id.as_str()));
        assert_eq!(receipt.raw_response["mock"], true);
    }

    #[tokio::test]
    async fn status_outcome_is_configurable() {
        let payment = payment();
        let status = MockGatewayClient::new()
            .with_status_outcome(ProviderState::Failed)
            .check_status(&payment)
            .await
            .unwrap();
        assert_eq!(status.state, ProviderState::Failed);
        assert_eq!(status.response_code.as_deref(), Some("PAYMENT_ERROR"));
    }
}
