//! PostgreSQL implementation of the OrderStore port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    MerchantTransactionId, PaymentId, PlanId, Timestamp, UserId,
};
use crate::domain::payment::{Amount, BillingCycle, Payment, PaymentStatus};
use crate::ports::{OrderStore, StoreError, TransitionFields};

pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    merchant_transaction_id: String,
    user_id: String,
    plan_id: String,
    billing_cycle: String,
    amount_minor: i64,
    status: String,
    provider_transaction_id: Option<String>,
    raw_provider_response: Option<serde_json::Value>,
    via_mock: bool,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            merchant_transaction_id: MerchantTransactionId::new(row.merchant_transaction_id)
                .map_err(|e| StoreError::Database(e.to_string()))?,
            user_id: UserId::new(row.user_id).map_err(|e| StoreError::Database(e.to_string()))?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| StoreError::Database(e.to_string()))?,
            billing_cycle: row
                .billing_cycle
                .parse::<BillingCycle>()
                .map_err(|e| StoreError::Database(e.to_string()))?,
            amount: Amount::from_minor_units(row.amount_minor)
                .map_err(|e| StoreError::Database(e.to_string()))?,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|e| StoreError::Database(e.to_string()))?,
            provider_transaction_id: row.provider_transaction_id,
            raw_provider_response: row.raw_provider_response,
            via_mock: row.via_mock,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, merchant_transaction_id, user_id, plan_id, billing_cycle, \
     amount_minor, status, provider_transaction_id, raw_provider_response, via_mock, \
     failure_reason, created_at, updated_at";

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, merchant_transaction_id, user_id, plan_id, billing_cycle,
                amount_minor, status, provider_transaction_id, raw_provider_response,
                via_mock, failure_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.merchant_transaction_id.as_str())
        .bind(payment.user_id.as_str())
        .bind(payment.plan_id.as_str())
        .bind(payment.billing_cycle.as_str())
        .bind(payment.amount.minor_units())
        .bind(payment.status.as_str())
        .bind(&payment.provider_transaction_id)
        .bind(&payment.raw_provider_response)
        .bind(payment.via_mock)
        .bind(&payment.failure_reason)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_merchant_transaction_id_key") {
                    return StoreError::DuplicateTransaction(
                        payment.merchant_transaction_id.clone(),
                    );
                }
            }
            StoreError::Database(format!("failed to insert payment: {e}"))
        })?;

        Ok(())
    }

    async fn transition(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        fields: TransitionFields,
    ) -> Result<Payment, StoreError> {
        // The WHERE status = $from clause is the compare half of the swap;
        // under concurrent writers Postgres serializes the row update and
        // exactly one caller matches.
        let query = format!(
            r#"
            UPDATE payments SET
                status = $3,
                provider_transaction_id = COALESCE($4, provider_transaction_id),
                raw_provider_response = COALESCE($5, raw_provider_response),
                via_mock = COALESCE($6, via_mock),
                failure_reason = COALESCE($7, failure_reason),
                updated_at = NOW()
            WHERE merchant_transaction_id = $1 AND status = $2
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row: Option<PaymentRow> = sqlx::query_as(&query)
            .bind(merchant_transaction_id.as_str())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(&fields.provider_transaction_id)
            .bind(&fields.raw_provider_response)
            .bind(fields.via_mock)
            .bind(&fields.failure_reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to transition payment: {e}")))?;

        match row {
            Some(row) => Payment::try_from(row),
            // The CAS missed. Re-read to tell a lost race from a missing row.
            None => {
                let current = self.get(merchant_transaction_id).await?;
                Err(StoreError::InvalidTransition {
                    expected: from,
                    actual: current.status,
                })
            }
        }
    }

    async fn get(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
    ) -> Result<Payment, StoreError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM payments WHERE merchant_transaction_id = $1"
        );
        let row: Option<PaymentRow> = sqlx::query_as(&query)
            .bind(merchant_transaction_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to fetch payment: {e}")))?;

        match row {
            Some(row) => Payment::try_from(row),
            None => Err(StoreError::NotFound(merchant_transaction_id.clone())),
        }
    }
}
