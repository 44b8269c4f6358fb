//! Persistence port for subscriptions.

use async_trait::async_trait;

use crate::domain::foundation::{SubscriptionId, UserId};
use crate::domain::subscription::Subscription;

use super::StoreError;

/// Store of subscriptions, at most one non-terminal per user.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a new subscription.
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError>;

    /// Persists changes to an existing subscription.
    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError>;

    /// Fetches by id.
    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError>;

    /// Fetches the user's current non-terminal subscription, if any.
    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, StoreError>;
}
