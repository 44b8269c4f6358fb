//! Status polling use case.
//!
//! Reconciles a payment against the provider: a terminal provider state
//! observed by polling is applied through the same compare-and-set path
//! webhooks use, so a poll and a webhook racing for the same payment
//! still produce exactly one terminal transition.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::MerchantTransactionId;
use crate::domain::payment::{Payment, PaymentEvent, PaymentStatus};
use crate::domain::subscription::SubscriptionLifecycle;
use crate::ports::{
    Clock, GatewayClient, OrderStore, ProviderState, StoreError, TransitionFields,
};

/// Snapshot returned to the caller.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub merchant_transaction_id: MerchantTransactionId,
    pub status: PaymentStatus,
    /// What the provider said on this poll; `None` when it was skipped
    /// (already terminal locally) or unreachable.
    pub provider_state: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub via_mock: bool,
}

#[derive(Debug, Error)]
pub enum CheckStatusError {
    #[error("payment not found: {0}")]
    NotFound(MerchantTransactionId),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CheckStatusError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(mtid) => Self::NotFound(mtid),
            other => Self::Store(other),
        }
    }
}

pub struct CheckStatusHandler {
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn GatewayClient>,
    lifecycle: Arc<SubscriptionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl CheckStatusHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn GatewayClient>,
        lifecycle: Arc<SubscriptionLifecycle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            gateway,
            lifecycle,
            clock,
        }
    }

    pub async fn handle(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
    ) -> Result<StatusReport, CheckStatusError> {
        let payment = self.orders.get(merchant_transaction_id).await?;

        // Terminal locally: nothing left to reconcile with the provider.
        // A completed payment may still owe its subscription effect if an
        // earlier delivery failed after the transition; settle that first.
        if payment.status.is_terminal() {
            if payment.status == PaymentStatus::Completed {
                self.lifecycle
                    .ensure_applied(&payment, self.clock.now())
                    .await
                    .map_err(CheckStatusError::Store)?;
            }
            return Ok(report(&payment, None));
        }

        let provider = match self.gateway.check_status(&payment).await {
            Ok(status) => status,
            Err(err) => {
                // An unreachable or confused provider never surfaces as a
                // caller error; the payment simply stays where it is.
                tracing::warn!(
                    merchant_transaction_id = %payment.merchant_transaction_id,
                    error = %err,
                    "status poll could not reach a provider verdict"
                );
                return Ok(report(&payment, None));
            }
        };

        let provider_state = provider_state_label(provider.state).to_string();

        let target = match provider.state {
            ProviderState::Completed => PaymentStatus::Completed,
            ProviderState::Failed => PaymentStatus::Failed,
            ProviderState::Pending => {
                return Ok(report(&payment, Some(provider_state)));
            }
        };

        let fields = TransitionFields {
            provider_transaction_id: provider.provider_transaction_id.clone(),
            raw_provider_response: Some(provider.raw_response.clone()),
            via_mock: None,
            failure_reason: match target {
                PaymentStatus::Failed => provider.response_code.clone(),
                _ => None,
            },
        };

        let updated = match self
            .orders
            .transition(&payment.merchant_transaction_id, payment.status, target, fields)
            .await
        {
            Ok(updated) => {
                let event = match target {
                    PaymentStatus::Completed => PaymentEvent::completed(&updated, self.clock.now()),
                    _ => PaymentEvent::failed(&updated),
                };
                self.lifecycle.apply(&event).await.map_err(CheckStatusError::Store)?;
                updated
            }
            // Lost the race against a webhook; the other writer's terminal
            // state stands.
            Err(StoreError::InvalidTransition { .. }) => {
                self.orders.get(&payment.merchant_transaction_id).await?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(report(&updated, Some(provider_state)))
    }
}

fn report(payment: &Payment, provider_state: Option<String>) -> StatusReport {
    StatusReport {
        merchant_transaction_id: payment.merchant_transaction_id.clone(),
        status: payment.status,
        provider_state,
        provider_transaction_id: payment.provider_transaction_id.clone(),
        via_mock: payment.via_mock,
    }
}

fn provider_state_label(state: ProviderState) -> &'static str {
    match state {
        ProviderState::Completed => "COMPLETED",
        ProviderState::Failed => "FAILED",
        ProviderState::Pending => "PENDING",
    }
}
