//! Persistence port for payment orders.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::MerchantTransactionId;
use crate::domain::payment::{Payment, PaymentStatus};

/// Errors a store can surface.
///
/// `DuplicateTransaction` and `InvalidTransition` are expected outcomes
/// under webhook redelivery and concurrent processing, not faults; callers
/// treat them as no-ops.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("merchant transaction id already exists: {0}")]
    DuplicateTransaction(MerchantTransactionId),

    #[error("payment is in state {actual}, expected {expected}")]
    InvalidTransition {
        expected: PaymentStatus,
        actual: PaymentStatus,
    },

    #[error("payment not found: {0}")]
    NotFound(MerchantTransactionId),

    #[error("constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Fields a transition may set alongside the status change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub provider_transaction_id: Option<String>,
    pub raw_provider_response: Option<serde_json::Value>,
    pub via_mock: Option<bool>,
    pub failure_reason: Option<String>,
}

/// Store of payment orders keyed by merchant transaction id.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new payment. Fails with `DuplicateTransaction` when the
    /// merchant transaction id is already taken.
    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError>;

    /// Atomically moves a payment from `from` to `to`, applying `fields`,
    /// and returns the updated row.
    ///
    /// The compare half of the swap happens inside the store, so when two
    /// writers race exactly one succeeds; the loser gets
    /// `InvalidTransition` carrying the state it actually found.
    async fn transition(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        fields: TransitionFields,
    ) -> Result<Payment, StoreError>;

    /// Fetches a payment by merchant transaction id.
    async fn get(
        &self,
        merchant_transaction_id: &MerchantTransactionId,
    ) -> Result<Payment, StoreError>;
}
