//! Payment aggregate and its status machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    MerchantTransactionId, PaymentId, PlanId, Timestamp, UserId, ValidationError,
};

use super::BillingCycle;

/// Payment amount in minor units (paise).
///
/// Callers supply minor units directly; nothing in the service converts
/// to or from rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount, rejecting zero and negatives.
    pub fn from_minor_units(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositiveAmount { value });
        }
        Ok(Self(value))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a payment.
///
/// Every state change goes through [`PaymentStatus::can_transition_to`];
/// stores enforce the same table atomically so concurrent writers cannot
/// both win a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a transition from `self` to `target` is allowed.
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ValidationError::invalid(
                "payment_status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// A payment record as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub merchant_transaction_id: MerchantTransactionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub billing_cycle: BillingCycle,
    pub amount: Amount,
    pub status: PaymentStatus,
    /// Provider-side transaction id, known once the provider reports one.
    pub provider_transaction_id: Option<String>,
    /// Raw provider response body, kept for reconciliation.
    pub raw_provider_response: Option<serde_json::Value>,
    /// Set when the order was served by the mock gateway.
    pub via_mock: bool,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything needed to create a pending payment.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub billing_cycle: BillingCycle,
    pub amount: Amount,
}

impl Payment {
    /// Builds a fresh pending payment from a draft.
    pub fn from_draft(draft: PaymentDraft, now: Timestamp) -> Self {
        Self {
            id: PaymentId::new(),
            merchant_transaction_id: MerchantTransactionId::generate(),
            user_id: draft.user_id,
            plan_id: draft.plan_id,
            billing_cycle: draft.billing_cycle,
            amount: draft.amount,
            status: PaymentStatus::Pending,
            provider_transaction_id: None,
            raw_provider_response: None,
            via_mock: false,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft() -> PaymentDraft {
        PaymentDraft {
            user_id: UserId::new("user-1").unwrap(),
            plan_id: PlanId::new("premium").unwrap(),
            billing_cycle: BillingCycle::Monthly,
            amount: Amount::from_minor_units(49_900).unwrap(),
        }
    }

    #[test]
    fn amount_rejects_non_positive() {
        assert!(Amount::from_minor_units(0).is_err());
        assert!(Amount::from_minor_units(-100).is_err());
        assert_eq!(Amount::from_minor_units(49_900).unwrap().minor_units(), 49_900);
    }

    #[test]
    fn new_payment_starts_pending() {
        let payment = Payment::from_draft(draft(), Timestamp::from_datetime(Utc::now()));
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(!payment.via_mock);
        assert!(payment.provider_transaction_id.is_none());
    }

    #[test]
    fn pending_allows_all_forward_transitions() {
        use PaymentStatus::*;
        for target in [Processing, Completed, Failed, Cancelled] {
            assert!(Pending.can_transition_to(target), "{target}");
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        use PaymentStatus::*;
        for terminal in [Completed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for target in [Pending, Processing, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn no_backward_transitions() {
        use PaymentStatus::*;
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
    }

    #[test]
    fn status_roundtrips_through_string() {
        use PaymentStatus::*;
        for status in [Pending, Processing, Completed, Failed, Cancelled] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("REFUNDED".parse::<PaymentStatus>().is_err());
    }
}
