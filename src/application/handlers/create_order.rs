//! Order creation use case.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{MerchantTransactionId, ValidationError};
use crate::domain::payment::{Payment, PaymentDraft, PaymentStatus};
use crate::ports::{Clock, GatewayClient, GatewayError, OrderStore, StoreError, TransitionFields};

/// What the caller needs to send the user off to pay.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub merchant_transaction_id: MerchantTransactionId,
    pub redirect_url: String,
    pub via_mock: bool,
}

#[derive(Debug, Error)]
pub enum CreateOrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("gateway rejected the order: {code}: {message}")]
    Rejected {
        merchant_transaction_id: MerchantTransactionId,
        code: String,
        message: String,
    },

    /// The order is recorded but the provider never acknowledged it. The
    /// payment stays pending for reconciliation via status polling.
    #[error("gateway unavailable, order {merchant_transaction_id} left pending")]
    Unavailable {
        merchant_transaction_id: MerchantTransactionId,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct CreateOrderHandler {
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn GatewayClient>,
    clock: Arc<dyn Clock>,
}

impl CreateOrderHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn GatewayClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            gateway,
            clock,
        }
    }

    /// Records a pending payment, submits the order, and advances the
    /// payment to `processing` once the provider acknowledges it.
    pub async fn handle(&self, draft: PaymentDraft) -> Result<CreateOrderResult, CreateOrderError> {
        let payment = Payment::from_draft(draft, self.clock.now());
        self.orders.create_payment(&payment).await?;

        tracing::info!(
            merchant_transaction_id = %payment.merchant_transaction_id,
            user_id = %payment.user_id,
            amount_minor = payment.amount.minor_units(),
            "payment order created"
        );

        match self.gateway.create_order(&payment).await {
            Ok(receipt) => {
                self.orders
                    .transition(
                        &payment.merchant_transaction_id,
                        PaymentStatus::Pending,
                        PaymentStatus::Processing,
                        TransitionFields {
                            provider_transaction_id: receipt.provider_transaction_id.clone(),
                            raw_provider_response: Some(receipt.raw_response.clone()),
                            via_mock: Some(receipt.via_mock),
                            failure_reason: None,
                        },
                    )
                    .await?;

                Ok(CreateOrderResult {
                    merchant_transaction_id: payment.merchant_transaction_id,
                    redirect_url: receipt.redirect_url,
                    via_mock: receipt.via_mock,
                })
            }
            Err(GatewayError::Rejected { code, message }) => {
                self.orders
                    .transition(
                        &payment.merchant_transaction_id,
                        PaymentStatus::Pending,
                        PaymentStatus::Failed,
                        TransitionFields {
                            failure_reason: Some(format!("{code}: {message}")),
                            ..Default::default()
                        },
                    )
                    .await?;
                Err(CreateOrderError::Rejected {
                    merchant_transaction_id: payment.merchant_transaction_id,
                    code,
                    message,
                })
            }
            Err(GatewayError::Unavailable(reason)) | Err(GatewayError::InvalidResponse(reason)) => {
                // No terminal transition: the provider may still have the
                // order, so the payment waits for a webhook or a poll.
                tracing::warn!(
                    merchant_transaction_id = %payment.merchant_transaction_id,
                    %reason,
                    "gateway unreachable, payment left pending"
                );
                Err(CreateOrderError::Unavailable {
                    merchant_transaction_id: payment.merchant_transaction_id,
                })
            }
        }
    }
}
