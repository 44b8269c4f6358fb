//! PostgreSQL implementation of the SubscriptionStore port.
//!
//! The one-active-subscription-per-user invariant is enforced by a
//! partial unique index over non-terminal statuses (see migrations).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{PaymentId, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::payment::BillingCycle;
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{StoreError, SubscriptionStore};

pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan_id: String,
    billing_cycle: String,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    last_payment_id: Option<Uuid>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| StoreError::Database(e.to_string()))?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| StoreError::Database(e.to_string()))?,
            billing_cycle: row
                .billing_cycle
                .parse::<BillingCycle>()
                .map_err(|e| StoreError::Database(e.to_string()))?,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| StoreError::Database(e.to_string()))?,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            last_payment_id: row.last_payment_id.map(PaymentId::from_uuid),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, plan_id, billing_cycle, status, \
     current_period_start, current_period_end, last_payment_id, cancelled_at, \
     created_at, updated_at";

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create(&self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, billing_cycle, status,
                current_period_start, current_period_end, last_payment_id,
                cancelled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.last_payment_id.as_ref().map(|id| *id.as_uuid()))
        .bind(subscription.cancelled_at.map(|ts| *ts.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_one_active_per_user") {
                    return StoreError::Conflict(format!(
                        "user {} already has an active subscription",
                        subscription.user_id
                    ));
                }
            }
            StoreError::Database(format!("failed to insert subscription: {e}"))
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan_id = $2,
                billing_cycle = $3,
                status = $4,
                current_period_start = $5,
                current_period_end = $6,
                last_payment_id = $7,
                cancelled_at = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.last_payment_id.as_ref().map(|id| *id.as_uuid()))
        .bind(subscription.cancelled_at.map(|ts| *ts.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("failed to update subscription: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database(format!(
                "subscription not found: {}",
                subscription.id
            )));
        }

        Ok(())
    }

    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = $1");
        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to fetch subscription: {e}")))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, StoreError> {
        let query = format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM subscriptions
            WHERE user_id = $1 AND status IN ('trialing', 'active', 'past_due')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to fetch subscription: {e}")))?;

        row.map(Subscription::try_from).transpose()
    }
}
