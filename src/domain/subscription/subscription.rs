//! Subscription aggregate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    PaymentId, PlanId, SubscriptionId, Timestamp, UserId, ValidationError,
};
use crate::domain::payment::BillingCycle;

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Completed,
}

impl SubscriptionStatus {
    /// Whether the subscription still entitles the user to the plan.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Trialing | Self::Active | Self::PastDue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trialing" => Ok(Self::Trialing),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::invalid(
                "subscription_status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// A user's subscription to a plan.
///
/// At most one non-terminal subscription exists per user; stores enforce
/// the constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    /// The payment that last activated or extended this subscription.
    pub last_payment_id: Option<PaymentId>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates an active subscription whose first period starts now.
    pub fn start(
        user_id: UserId,
        plan_id: PlanId,
        billing_cycle: BillingCycle,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_id,
            billing_cycle,
            status: SubscriptionStatus::Active,
            current_period_start: now,
            current_period_end: billing_cycle.period_end_from(now),
            last_payment_id: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Extends the current period by one billing cycle.
    ///
    /// The new period is anchored at the later of `now` and the current
    /// period end, so paying early never shortens the entitlement and a
    /// lapsed subscription restarts from the payment time instead of
    /// back-dating.
    pub fn extend(&mut self, now: Timestamp) {
        let anchor = now.max(self.current_period_end);
        self.current_period_end = self.billing_cycle.period_end_from(anchor);
        self.current_period_start = anchor;
        self.status = SubscriptionStatus::Active;
        self.updated_at = now;
    }

    /// Marks the subscription cancelled. Access runs out at the current
    /// period end; this only stops future renewals.
    pub fn cancel(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }

    /// Marks a fixed-length subscription as having run its full course.
    pub fn complete(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Completed;
        self.updated_at = now;
    }

    /// Marks the subscription as behind on payment.
    pub fn mark_past_due(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::PastDue;
        self.updated_at = now;
    }
}
