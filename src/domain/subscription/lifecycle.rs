//! Subscription lifecycle service.
//!
//! Reacts to payment outcomes and provider subscription events. All
//! period math is calendar-aware and anchored so that early renewals
//! extend rather than overwrite the remaining entitlement.

use std::sync::Arc;

use crate::domain::foundation::{PaymentId, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::payment::{BillingCycle, Payment, PaymentEvent};
use crate::ports::{Clock, StoreError, SubscriptionStore};

use super::Subscription;

pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionLifecycle {
    pub fn new(store: Arc<dyn SubscriptionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Applies the outcome of a payment.
    ///
    /// A completed payment activates or extends the user's subscription.
    /// A failed payment marks an existing subscription past due; when the
    /// user has none (a failed first purchase) nothing happens. A
    /// cancelled payment never touches the subscription.
    pub async fn apply(&self, event: &PaymentEvent) -> Result<(), StoreError> {
        match event {
            PaymentEvent::Completed {
                payment_id,
                user_id,
                plan_id,
                billing_cycle,
                effective_at,
                ..
            } => {
                // last_payment_id rides in the same store write as the
                // activation, so its presence proves the whole effect landed.
                self.activate_or_extend_for(
                    user_id,
                    plan_id,
                    *billing_cycle,
                    *effective_at,
                    Some(*payment_id),
                )
                .await?;
                Ok(())
            }
            PaymentEvent::Failed { user_id, .. } => {
                if let Some(mut sub) = self.store.find_active_for_user(user_id).await? {
                    sub.mark_past_due(self.clock.now());
                    self.store.update(&sub).await?;
                }
                Ok(())
            }
            PaymentEvent::Cancelled { .. } => Ok(()),
        }
    }

    /// Activates a new subscription, or extends the existing one by a
    /// billing cycle.
    ///
    /// Extension anchors at the later of `effective_at` and the current
    /// period end. A plan switch takes effect on the extension.
    pub async fn activate_or_extend(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        billing_cycle: BillingCycle,
        effective_at: Timestamp,
    ) -> Result<Subscription, StoreError> {
        self.activate_or_extend_for(user_id, plan_id, billing_cycle, effective_at, None)
            .await
    }

    async fn activate_or_extend_for(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        billing_cycle: BillingCycle,
        effective_at: Timestamp,
        last_payment_id: Option<PaymentId>,
    ) -> Result<Subscription, StoreError> {
        match self.store.find_active_for_user(user_id).await? {
            Some(mut sub) => {
                sub.plan_id = plan_id.clone();
                sub.billing_cycle = billing_cycle;
                sub.extend(effective_at);
                if last_payment_id.is_some() {
                    sub.last_payment_id = last_payment_id;
                }
                self.store.update(&sub).await?;
                Ok(sub)
            }
            None => {
                let mut sub = Subscription::start(
                    user_id.clone(),
                    plan_id.clone(),
                    billing_cycle,
                    effective_at,
                );
                sub.last_payment_id = last_payment_id;
                self.store.create(&sub).await?;
                Ok(sub)
            }
        }
    }

    /// Re-applies a completed payment whose subscription effect is
    /// missing, as after a delivery that failed between the payment
    /// transition and the subscription write. A payment the active
    /// subscription already records is left alone. Returns whether a
    /// repair happened.
    pub async fn ensure_applied(
        &self,
        payment: &Payment,
        effective_at: Timestamp,
    ) -> Result<bool, StoreError> {
        if let Some(sub) = self.store.find_active_for_user(&payment.user_id).await? {
            if sub.last_payment_id == Some(payment.id) {
                return Ok(false);
            }
        }
        self.apply(&PaymentEvent::completed(payment, effective_at))
            .await?;
        Ok(true)
    }

    /// Extends a known subscription by one billing cycle. Used for
    /// provider-driven recurring charges. `Ok(None)` when the id is
    /// unknown, so webhook dispatch can acknowledge and move on.
    pub async fn renew(
        &self,
        id: &SubscriptionId,
        effective_at: Timestamp,
    ) -> Result<Option<Subscription>, StoreError> {
        let Some(mut sub) = self.store.get(id).await? else {
            return Ok(None);
        };
        sub.extend(effective_at);
        self.store.update(&sub).await?;
        Ok(Some(sub))
    }

    /// Cancels the user's current subscription. Idempotent: cancelling a
    /// user with no active subscription is a no-op.
    pub async fn cancel(&self, user_id: &UserId) -> Result<Option<Subscription>, StoreError> {
        match self.store.find_active_for_user(user_id).await? {
            Some(mut sub) => {
                sub.cancel(self.clock.now());
                self.store.update(&sub).await?;
                Ok(Some(sub))
            }
            None => Ok(None),
        }
    }

    /// Cancels a known subscription by id. Idempotent.
    pub async fn cancel_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let Some(mut sub) = self.store.get(id).await? else {
            return Ok(None);
        };
        if sub.cancelled_at.is_none() {
            sub.cancel(self.clock.now());
            self.store.update(&sub).await?;
        }
        Ok(Some(sub))
    }

    /// Marks a subscription as having run its full course.
    pub async fn complete(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        let Some(mut sub) = self.store.get(id).await? else {
            return Ok(None);
        };
        sub.complete(self.clock.now());
        self.store.update(&sub).await?;
        Ok(Some(sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::MerchantTransactionId;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::test_support::FixedClock;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn lifecycle(now: Timestamp) -> (SubscriptionLifecycle, Arc<InMemorySubscriptionStore>) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let clock = Arc::new(FixedClock::at(now));
        (SubscriptionLifecycle::new(store.clone(), clock), store)
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn plan() -> PlanId {
        PlanId::new("premium").unwrap()
    }

    fn completed_event(effective_at: Timestamp) -> PaymentEvent {
        PaymentEvent::Completed {
            payment_id: crate::domain::foundation::PaymentId::new(),
            merchant_transaction_id: MerchantTransactionId::generate(),
            user_id: user(),
            plan_id: plan(),
            billing_cycle: BillingCycle::Monthly,
            effective_at,
        }
    }

    #[tokio::test]
    async fn completed_payment_activates_new_subscription() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        lifecycle.apply(&completed_event(ts(2024, 3, 1))).await.unwrap();

        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.current_period_end, ts(2024, 4, 1));
    }

    #[tokio::test]
    async fn second_completed_payment_extends_not_restarts() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        lifecycle.apply(&completed_event(ts(2024, 3, 1))).await.unwrap();
        // Renewal arrives ten days early.
        lifecycle.apply(&completed_event(ts(2024, 3, 22))).await.unwrap();

        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.current_period_end, ts(2024, 5, 1));
    }

    #[tokio::test]
    async fn payment_after_lapse_restarts_from_payment_time() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        lifecycle.apply(&completed_event(ts(2024, 3, 1))).await.unwrap();
        lifecycle.apply(&completed_event(ts(2024, 8, 15))).await.unwrap();

        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.current_period_start, ts(2024, 8, 15));
        assert_eq!(sub.current_period_end, ts(2024, 9, 15));
    }

    #[tokio::test]
    async fn failed_payment_marks_existing_subscription_past_due() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        lifecycle.apply(&completed_event(ts(2024, 3, 1))).await.unwrap();
        lifecycle
            .apply(&PaymentEvent::Failed {
                merchant_transaction_id: MerchantTransactionId::generate(),
                user_id: user(),
                reason: Some("INSUFFICIENT_FUNDS".to_string()),
            })
            .await
            .unwrap();

        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn failed_first_purchase_creates_nothing() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        lifecycle
            .apply(&PaymentEvent::Failed {
                merchant_transaction_id: MerchantTransactionId::generate(),
                user_id: user(),
                reason: None,
            })
            .await
            .unwrap();

        assert!(store.find_active_for_user(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (lifecycle, _store) = lifecycle(ts(2024, 3, 1));
        lifecycle.apply(&completed_event(ts(2024, 3, 1))).await.unwrap();

        let cancelled = lifecycle.cancel(&user()).await.unwrap();
        assert!(cancelled.is_some());
        // Second cancel finds nothing active and does nothing.
        assert!(lifecycle.cancel(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn renew_extends_by_id() {
        let (lifecycle, _store) = lifecycle(ts(2024, 3, 1));
        let sub = lifecycle
            .activate_or_extend(&user(), &plan(), BillingCycle::Annual, ts(2024, 2, 29))
            .await
            .unwrap();
        assert_eq!(sub.current_period_end, ts(2025, 2, 28));

        let renewed = lifecycle.renew(&sub.id, ts(2025, 1, 1)).await.unwrap().unwrap();
        assert_eq!(renewed.current_period_end, ts(2026, 2, 28));
    }

    #[tokio::test]
    async fn renew_of_unknown_id_is_none() {
        let (lifecycle, _store) = lifecycle(ts(2024, 3, 1));
        let unknown = crate::domain::foundation::SubscriptionId::new();
        assert!(lifecycle.renew(&unknown, ts(2024, 3, 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_marks_terminal() {
        let (lifecycle, _store) = lifecycle(ts(2024, 3, 1));
        let sub = lifecycle
            .activate_or_extend(&user(), &plan(), BillingCycle::Monthly, ts(2024, 3, 1))
            .await
            .unwrap();

        let completed = lifecycle.complete(&sub.id).await.unwrap().unwrap();
        assert_eq!(completed.status, SubscriptionStatus::Completed);
    }

    fn completed_payment() -> crate::domain::payment::Payment {
        use crate::domain::payment::{Amount, PaymentDraft};
        Payment::from_draft(
            PaymentDraft {
                user_id: user(),
                plan_id: plan(),
                billing_cycle: BillingCycle::Monthly,
                amount: Amount::from_minor_units(49_900).unwrap(),
            },
            ts(2024, 3, 1),
        )
    }

    #[tokio::test]
    async fn ensure_applied_repairs_missing_subscription() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        let payment = completed_payment();

        let repaired = lifecycle.ensure_applied(&payment, ts(2024, 3, 1)).await.unwrap();
        assert!(repaired);

        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.last_payment_id, Some(payment.id));
        assert_eq!(sub.current_period_end, ts(2024, 4, 1));
    }

    #[tokio::test]
    async fn ensure_applied_leaves_recorded_payment_alone() {
        let (lifecycle, store) = lifecycle(ts(2024, 3, 1));
        let payment = completed_payment();
        lifecycle.ensure_applied(&payment, ts(2024, 3, 1)).await.unwrap();

        let repaired = lifecycle.ensure_applied(&payment, ts(2024, 3, 5)).await.unwrap();
        assert!(!repaired);

        // No second extension.
        let sub = store.find_active_for_user(&user()).await.unwrap().unwrap();
        assert_eq!(sub.current_period_end, ts(2024, 4, 1));
    }
}
