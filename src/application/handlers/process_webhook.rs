//! Webhook processing use case.
//!
//! Verify, parse, dispatch. Idempotence comes from the order store's
//! compare-and-set: a redelivered event finds the payment already
//! terminal and short-circuits as a duplicate, acknowledged with success
//! so the provider stops retrying.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{MerchantTransactionId, SubscriptionId};
use crate::domain::payment::{PaymentEvent, PaymentStatus};
use crate::domain::signature::SignatureCodec;
use crate::domain::subscription::SubscriptionLifecycle;
use crate::domain::webhook::{PaymentEntity, SubscriptionEntity, WebhookError, WebhookEvent};
use crate::ports::{Clock, OrderStore, StoreError, TransitionFields};

/// How a webhook delivery was absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event caused a state change.
    Processed,
    /// The payment was already terminal; nothing reapplied.
    Duplicate,
    /// Unknown kind or unknown entity; acknowledged without effect.
    Ignored,
}

#[derive(Debug, Error)]
pub enum ProcessWebhookError {
    /// Tampering or misconfiguration. Rejected outright; the provider
    /// must not retry.
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    #[error(transparent)]
    Malformed(#[from] WebhookError),

    /// Surfaced as a 500 so the provider redelivers later.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ProcessWebhookHandler {
    orders: Arc<dyn OrderStore>,
    lifecycle: Arc<SubscriptionLifecycle>,
    codec: SignatureCodec,
    webhook_path: String,
    clock: Arc<dyn Clock>,
}

impl ProcessWebhookHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        lifecycle: Arc<SubscriptionLifecycle>,
        codec: SignatureCodec,
        webhook_path: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            lifecycle,
            codec,
            webhook_path: webhook_path.into(),
            clock,
        }
    }

    /// Handles one delivery: raw body bytes plus the `X-VERIFY` header.
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, ProcessWebhookError> {
        let Some(signature) = signature else {
            tracing::warn!("webhook delivered without a signature header");
            return Err(ProcessWebhookError::SignatureInvalid);
        };

        let encoded = self.codec.encode_payload(raw_body);
        if !self.codec.verify(&encoded, &self.webhook_path, signature) {
            tracing::warn!("webhook signature rejected");
            return Err(ProcessWebhookError::SignatureInvalid);
        }

        let event = WebhookEvent::parse(raw_body)?;
        tracing::debug!(kind = event.kind(), "webhook verified and parsed");

        match event {
            WebhookEvent::PaymentCaptured(entity) | WebhookEvent::PaymentLinkPaid(entity) => {
                self.settle_payment(entity, PaymentStatus::Completed).await
            }
            WebhookEvent::PaymentFailed(entity) => {
                self.settle_payment(entity, PaymentStatus::Failed).await
            }
            WebhookEvent::SubscriptionCharged(entity) => {
                let Some(id) = parse_subscription_id(&entity) else {
                    return Ok(WebhookOutcome::Ignored);
                };
                match self.lifecycle.renew(&id, self.clock.now()).await? {
                    Some(_) => Ok(WebhookOutcome::Processed),
                    None => {
                        tracing::warn!(subscription_id = %id, "charge for unknown subscription");
                        Ok(WebhookOutcome::Ignored)
                    }
                }
            }
            WebhookEvent::SubscriptionCompleted(entity) => {
                let Some(id) = parse_subscription_id(&entity) else {
                    return Ok(WebhookOutcome::Ignored);
                };
                match self.lifecycle.complete(&id).await? {
                    Some(_) => Ok(WebhookOutcome::Processed),
                    None => Ok(WebhookOutcome::Ignored),
                }
            }
            WebhookEvent::SubscriptionCancelled(entity) => {
                let Some(id) = parse_subscription_id(&entity) else {
                    return Ok(WebhookOutcome::Ignored);
                };
                match self.lifecycle.cancel_by_id(&id).await? {
                    Some(_) => Ok(WebhookOutcome::Processed),
                    None => Ok(WebhookOutcome::Ignored),
                }
            }
            WebhookEvent::Unknown(kind) => {
                tracing::debug!(%kind, "ignoring unhandled webhook kind");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    /// Drives a payment to a terminal status via compare-and-set, then
    /// feeds the outcome to the subscription lifecycle.
    async fn settle_payment(
        &self,
        entity: PaymentEntity,
        target: PaymentStatus,
    ) -> Result<WebhookOutcome, ProcessWebhookError> {
        let Ok(mtid) = MerchantTransactionId::new(entity.merchant_transaction_id.clone()) else {
            tracing::warn!("webhook payment entity carries an empty transaction id");
            return Ok(WebhookOutcome::Ignored);
        };

        let payment = match self.orders.get(&mtid).await {
            Ok(payment) => payment,
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(merchant_transaction_id = %mtid, "webhook for unknown payment");
                return Ok(WebhookOutcome::Ignored);
            }
            Err(err) => return Err(err.into()),
        };

        if payment.status.is_terminal() {
            // A delivery that failed after the payment transition left a
            // completed payment without its subscription; redelivery lands
            // here, so the repair has to happen before absorbing it.
            if payment.status == PaymentStatus::Completed {
                let repaired = self
                    .lifecycle
                    .ensure_applied(&payment, self.clock.now())
                    .await?;
                if repaired {
                    tracing::info!(
                        merchant_transaction_id = %mtid,
                        "redelivery repaired a missing subscription effect"
                    );
                }
            }
            return Ok(WebhookOutcome::Duplicate);
        }

        let fields = TransitionFields {
            provider_transaction_id: entity.transaction_id.clone(),
            raw_provider_response: None,
            via_mock: None,
            failure_reason: match target {
                PaymentStatus::Failed => entity.failure_reason.clone(),
                _ => None,
            },
        };

        let updated = match self
            .orders
            .transition(&mtid, payment.status, target, fields)
            .await
        {
            Ok(updated) => updated,
            // Raced with another delivery or a status poll; whoever won
            // already applied the side effects.
            Err(StoreError::InvalidTransition { .. }) => {
                return Ok(WebhookOutcome::Duplicate);
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            merchant_transaction_id = %mtid,
            status = %updated.status,
            "payment settled by webhook"
        );

        let event = match target {
            PaymentStatus::Completed => PaymentEvent::completed(&updated, self.clock.now()),
            _ => PaymentEvent::failed(&updated),
        };
        self.lifecycle.apply(&event).await?;

        Ok(WebhookOutcome::Processed)
    }
}

fn parse_subscription_id(entity: &SubscriptionEntity) -> Option<SubscriptionId> {
    match SubscriptionId::from_str(&entity.subscription_id) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!(
                subscription_id = %entity.subscription_id,
                "webhook subscription entity id is not a uuid"
            );
            None
        }
    }
}
