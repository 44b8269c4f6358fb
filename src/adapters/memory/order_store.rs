//! In-memory order store.
//!
//! Holds the mutex across the whole check-and-swap so a transition is
//! atomic, matching the row-level guarantee the Postgres adapter gets
//! from its conditional UPDATE.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{MerchantTransactionId, Timestamp};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{OrderStore, StoreError, TransitionFields};

pub struct InMemoryOrderStore {
    payments: Mutex<HashMap<MerchantTransactionId, Payment>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut payments = self.payments.lock().await;
        if payments.contains_key(&payment.merchant_transaction_id) {
            return Err(StoreError::DuplicateTransaction(
                payment.merchant_transaction_id.clone(),
            ));
        }
        payments.insert(payment.merchant_transaction_id.clone(), payment.clone());
        Ok(())
    }

    async fn transition(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        fields: TransitionFields,
    ) -> Result<Payment, StoreError> {
        let mut payments = self.payments.lock().await;
        let payment = payments
            .get_mut(merchant_transaction_id)
            .ok_or_else(|| StoreError::NotFound(merchant_transaction_id.clone()))?;

        if payment.status != from {
            return Err(StoreError::InvalidTransition {
                expected: from,
                actual: payment.status,
            });
        }

        payment.status = to;
        if let Some(id) = fields.provider_transaction_id {
            payment.provider_transaction_id = Some(id);
        }
        if let Some(raw) = fields.raw_provider_response {
            payment.raw_provider_response = Some(raw);
        }
        if let Some(via_mock) = fields.via_mock {
            payment.via_mock = via_mock;
        }
        if let Some(reason) = fields.failure_reason {
            payment.failure_reason = Some(reason);
        }
        payment.updated_at = Timestamp::now();

        Ok(payment.clone())
    }

    async fn get(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
    ) -> Result<Payment, StoreError> {
        let payments = self.payments.lock().await;
        payments
            .get(merchant_transaction_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(merchant_transaction_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::foundation::{PlanId, UserId};
    use crate::domain::payment::{Amount, BillingCycle, PaymentDraft};

    fn pending_payment() -> Payment {
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
    async fn create_then_get() {
        let store = InMemoryOrderStore::new();
        let payment = pending_payment();
        store.create_payment(&payment).await.unwrap();

        let fetched = store.get(&payment.merchant_transaction_id).await.unwrap();
        assert_eq!(fetched.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = InMemoryOrderStore::new();
        let payment = pending_payment();
        store.create_payment(&payment).await.unwrap();

        assert!(matches!(
            store.create_payment(&payment).await,
            Err(StoreError::DuplicateTransaction(_))
        ));
    }

    #[tokio::test]
    async fn transition_applies_fields() {
        let store = InMemoryOrderStore::new();
        let payment = pending_payment();
        store.create_payment(&payment).await.unwrap();

        let updated = store
            .transition(
                &payment.merchant_transaction_id,
                PaymentStatus::Pending,
                PaymentStatus::Processing,
                TransitionFields {
                    provider_transaction_id: Some("T123".to_string()),
                    via_mock: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, PaymentStatus::Processing);
        assert_eq!(updated.provider_transaction_id.as_deref(), Some("T123"));
        assert!(updated.via_mock);
    }

    #[tokio::test]
    async fn transition_with_stale_expectation_reports_actual() {
        let store = InMemoryOrderStore::new();
        let payment = pending_payment();
        store.create_payment(&payment).await.unwrap();
        store
            .transition(
                &payment.merchant_transaction_id,
                PaymentStatus::Pending,
                PaymentStatus::Completed,
                TransitionFields::default(),
            )
            .await
            .unwrap();

        let err = store
            .transition(
                &payment.merchant_transaction_id,
                PaymentStatus::Pending,
                PaymentStatus::Failed,
                TransitionFields::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                expected: PaymentStatus::Pending,
                actual: PaymentStatus::Completed,
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_transitions_have_exactly_one_winner() {
        let store = Arc::new(InMemoryOrderStore::new());
        let payment = pending_payment();
        store.create_payment(&payment).await.unwrap();

        let mtid = payment.merchant_transaction_id.clone();
        let complete = {
            let store = store.clone();
            let mtid = mtid.clone();
            tokio::spawn(async move {
                store
                    .transition(
                        &mtid,
                        PaymentStatus::Pending,
                        PaymentStatus::Completed,
                        TransitionFields::default(),
                    )
                    .await
            })
        };
        let fail = {
            let store = store.clone();
            let mtid = mtid.clone();
            tokio::spawn(async move {
                store
                    .transition(
                        &mtid,
                        PaymentStatus::Pending,
                        PaymentStatus::Failed,
                        TransitionFields::default(),
                    )
                    .await
            })
        };

        let (complete, fail) = (complete.await.unwrap(), fail.await.unwrap());
        let winners = [complete.is_ok(), fail.is_ok()]
            .iter()
            .filter(|won| **won)
            .count();
        assert_eq!(winners, 1);

        let loser = if complete.is_err() { complete } else { fail };
        assert!(matches!(
            loser,
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn missing_payment_is_not_found() {
        let store = InMemoryOrderStore::new();
        let mtid = MerchantTransactionId::generate();
        assert!(matches!(
            store.get(&mtid).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
