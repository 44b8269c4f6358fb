//! Webhook event envelope parsing.
//!
//! The provider posts `{ "event": "<kind>", "payload": { "<entity>":
//! { "entity": {...} } } }`. Each kind reads only the entity fields it
//! needs; everything else in the body is ignored. Events are ephemeral
//! and never persisted.

use serde::Deserialize;
use serde_json::Value;

use super::WebhookError;

/// Payment entity carried by `payment.*` and `payment_link.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    /// Correlates back to the payment we created the order for. Providers
    /// name this field differently per event family.
    #[serde(alias = "order_id", alias = "merchantTransactionId")]
    pub merchant_transaction_id: String,
    /// Provider-side transaction id.
    #[serde(default, alias = "id", alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default, alias = "error_description", alias = "error_reason")]
    pub failure_reason: Option<String>,
}

/// Subscription entity carried by `subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEntity {
    #[serde(alias = "id")]
    pub subscription_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default, alias = "current_end")]
    pub current_period_end: Option<i64>,
}

/// A webhook event, keyed by its kind.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    PaymentCaptured(PaymentEntity),
    PaymentFailed(PaymentEntity),
    PaymentLinkPaid(PaymentEntity),
    SubscriptionCharged(SubscriptionEntity),
    SubscriptionCompleted(SubscriptionEntity),
    SubscriptionCancelled(SubscriptionEntity),
    /// Any kind we do not handle. Acknowledged without side effects so the
    /// provider stops redelivering.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: serde_json::Map<String, Value>,
}

impl WebhookEvent {
    /// Parses a raw webhook body. Call only after signature verification.
    pub fn parse(raw_body: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(raw_body)?;
        let kind = envelope.event.as_str();

        match kind {
            "payment.captured" => Ok(Self::PaymentCaptured(payment_entity(&envelope)?)),
            "payment.failed" => Ok(Self::PaymentFailed(payment_entity(&envelope)?)),
            "payment_link.paid" => Ok(Self::PaymentLinkPaid(payment_entity(&envelope)?)),
            "subscription.charged" => Ok(Self::SubscriptionCharged(subscription_entity(&envelope)?)),
            "subscription.completed" => {
                Ok(Self::SubscriptionCompleted(subscription_entity(&envelope)?))
            }
            "subscription.cancelled" => {
                Ok(Self::SubscriptionCancelled(subscription_entity(&envelope)?))
            }
            _ => Ok(Self::Unknown(envelope.event)),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::PaymentCaptured(_) => "payment.captured",
            Self::PaymentFailed(_) => "payment.failed",
            Self::PaymentLinkPaid(_) => "payment_link.paid",
            Self::SubscriptionCharged(_) => "subscription.charged",
            Self::SubscriptionCompleted(_) => "subscription.completed",
            Self::SubscriptionCancelled(_) => "subscription.cancelled",
            Self::Unknown(kind) => kind,
        }
    }
}

/// Locates the `entity` object under any of the containers this event
/// family uses.
fn entity_value<'a>(envelope: &'a Envelope, containers: &[&str]) -> Option<&'a Value> {
    containers
        .iter()
        .find_map(|container| envelope.payload.get(*container)?.get("entity"))
}

fn payment_entity(envelope: &Envelope) -> Result<PaymentEntity, WebhookError> {
    let value = entity_value(envelope, &["payment", "order", "payment_link"]).ok_or_else(|| {
        WebhookError::MissingEntity {
            kind: envelope.event.clone(),
        }
    })?;
    serde_json::from_value(value.clone()).map_err(|err| WebhookError::MalformedEntity {
        kind: envelope.event.clone(),
        message: err.to_string(),
    })
}

fn subscription_entity(envelope: &Envelope) -> Result<SubscriptionEntity, WebhookError> {
    let value =
        entity_value(envelope, &["subscription"]).ok_or_else(|| WebhookError::MissingEntity {
            kind: envelope.event.clone(),
        })?;
    serde_json::from_value(value.clone()).map_err(|err| WebhookError::MalformedEntity {
        kind: envelope.event.clone(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_payment_captured() {
        let body = br#"{
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_123",
                        "order_id": "MTabc",
                        "amount": 49900
                    }
                }
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::PaymentCaptured(entity) => {
                assert_eq!(entity.merchant_transaction_id, "MTabc");
                assert_eq!(entity.transaction_id.as_deref(), Some("pay_123"));
                assert_eq!(entity.amount, Some(49900));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parses_payment_failed_with_reason() {
        let body = br#"{
            "event": "payment.failed",
            "payload": {
                "payment": {
                    "entity": {
                        "order_id": "MTabc",
                        "error_description": "insufficient funds"
                    }
                }
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::PaymentFailed(entity) => {
                assert_eq!(entity.failure_reason.as_deref(), Some("insufficient funds"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn payment_link_paid_reads_order_container() {
        let body = br#"{
            "event": "payment_link.paid",
            "payload": {
                "order": { "entity": { "order_id": "MTxyz" } }
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::PaymentLinkPaid(entity) => {
                assert_eq!(entity.merchant_transaction_id, "MTxyz");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parses_subscription_events() {
        let body = br#"{
            "event": "subscription.charged",
            "payload": {
                "subscription": { "entity": { "id": "c6b94f57-0000-0000-0000-000000000001" } }
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::SubscriptionCharged(entity) => {
                assert!(entity.subscription_id.starts_with("c6b94f57"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let body = br#"{ "event": "refund.created", "payload": {} }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::Unknown(kind) => assert_eq!(kind, "refund.created"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn known_kind_without_entity_is_an_error() {
        let body = br#"{ "event": "payment.captured", "payload": {} }"#;
        assert!(matches!(
            WebhookEvent::parse(body),
            Err(WebhookError::MissingEntity { .. })
        ));
    }

    #[test]
    fn garbage_body_is_a_malformed_envelope() {
        assert!(matches!(
            WebhookEvent::parse(b"not json"),
            Err(WebhookError::MalformedEnvelope(_))
        ));
    }
}
