//! In-memory subscription store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{SubscriptionId, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::{StoreError, SubscriptionStore};

pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.lock().await;
        let already_active = subscriptions
            .values()
            .any(|sub| sub.user_id == subscription.user_id && sub.status.grants_access());
        if already_active {
            return Err(StoreError::Conflict(format!(
                "user {} already has an active subscription",
                subscription.user_id
            )));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.lock().await;
        if !subscriptions.contains_key(&subscription.id) {
            return Err(StoreError::Database(format!(
                "subscription not found: {}",
                subscription.id
            )));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        let subscriptions = self.subscriptions.lock().await;
        Ok(subscriptions.get(id).cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, StoreError> {
        let subscriptions = self.subscriptions.lock().await;
        Ok(subscriptions
            .values()
            .find(|sub| &sub.user_id == user_id && sub.status.grants_access())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::foundation::{PlanId, Timestamp};
    use crate::domain::payment::BillingCycle;

    fn subscription(user: &str) -> Subscription {
        Subscription::start(
            UserId::new(user).unwrap(),
            PlanId::new("premium").unwrap(),
            BillingCycle::Monthly,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn one_active_subscription_per_user() {
        let store = InMemorySubscriptionStore::new();
        store.create(&subscription("user-1")).await.unwrap();

        assert!(matches!(
            store.create(&subscription("user-1")).await,
            Err(StoreError::Conflict(_))
        ));
        // A different user is unaffected.
        store.create(&subscription("user-2")).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_subscription_frees_the_slot() {
        let store = InMemorySubscriptionStore::new();
        let mut sub = subscription("user-1");
        store.create(&sub).await.unwrap();

        sub.cancel(Timestamp::now());
        store.update(&sub).await.unwrap();

        assert!(store
            .find_active_for_user(&UserId::new("user-1").unwrap())
            .await
            .unwrap()
            .is_none());
        store.create(&subscription("user-1")).await.unwrap();
    }

    #[tokio::test]
    async fn update_of_unknown_subscription_fails() {
        let store = InMemorySubscriptionStore::new();
        assert!(store.update(&subscription("user-1")).await.is_err());
    }
}
