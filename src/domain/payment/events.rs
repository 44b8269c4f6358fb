//! Events raised when a payment reaches a terminal state.
//!
//! Events are built by the application layer from the payment row a
//! successful state transition returned, so a transition that lost the
//! compare-and-set race never produces one.

use crate::domain::foundation::{MerchantTransactionId, PaymentId, PlanId, Timestamp, UserId};

use super::{BillingCycle, Payment};

/// Outcome of a payment, consumed by the subscription lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    Completed {
        payment_id: PaymentId,
        merchant_transaction_id: MerchantTransactionId,
        user_id: UserId,
        plan_id: PlanId,
        billing_cycle: BillingCycle,
        effective_at: Timestamp,
    },
    Failed {
        merchant_transaction_id: MerchantTransactionId,
        user_id: UserId,
        reason: Option<String>,
    },
    Cancelled {
        merchant_transaction_id: MerchantTransactionId,
        user_id: UserId,
    },
}

impl PaymentEvent {
    /// Builds the completed event for a payment that just transitioned.
    pub fn completed(payment: &Payment, effective_at: Timestamp) -> Self {
        Self::Completed {
            payment_id: payment.id,
            merchant_transaction_id: payment.merchant_transaction_id.clone(),
            user_id: payment.user_id.clone(),
            plan_id: payment.plan_id.clone(),
            billing_cycle: payment.billing_cycle,
            effective_at,
        }
    }

    pub fn failed(payment: &Payment) -> Self {
        Self::Failed {
            merchant_transaction_id: payment.merchant_transaction_id.clone(),
            user_id: payment.user_id.clone(),
            reason: payment.failure_reason.clone(),
        }
    }
}
