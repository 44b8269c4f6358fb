//! Request and response shapes for the HTTP surface.
//!
//! The public API speaks camelCase to match what the legacy frontend
//! already sends.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{CreateOrderResult, StatusReport};
use crate::domain::foundation::ValidationError;
use crate::domain::payment::{Amount, BillingCycle, PaymentDraft};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayRequest {
    pub user_id: String,
    pub plan_id: String,
    pub billing_cycle: String,
    /// Minor units. Validated positive before anything is signed or sent.
    pub amount: i64,
}

impl CreatePayRequest {
    pub fn into_draft(self) -> Result<PaymentDraft, ValidationError> {
        Ok(PaymentDraft {
            user_id: crate::domain::foundation::UserId::new(self.user_id)?,
            plan_id: crate::domain::foundation::PlanId::new(self.plan_id)?,
            billing_cycle: self.billing_cycle.parse::<BillingCycle>()?,
            amount: Amount::from_minor_units(self.amount)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayResponse {
    pub success: bool,
    pub merchant_transaction_id: String,
    pub redirect_url: String,
    pub via_mock: bool,
}

impl From<CreateOrderResult> for CreatePayResponse {
    fn from(result: CreateOrderResult) -> Self {
        Self {
            success: true,
            merchant_transaction_id: result.merchant_transaction_id.to_string(),
            redirect_url: result.redirect_url,
            via_mock: result.via_mock,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub merchant_transaction_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub merchant_transaction_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_transaction_id: Option<String>,
    pub via_mock: bool,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            success: true,
            merchant_transaction_id: report.merchant_transaction_id.to_string(),
            status: report.status.to_string(),
            provider_state: report.provider_state,
            provider_transaction_id: report.provider_transaction_id,
            via_mock: report.via_mock,
        }
    }
}

/// Every webhook acknowledgement, processed or absorbed, looks the same
/// to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub gateway_mode: String,
    pub merchant_id: String,
}
