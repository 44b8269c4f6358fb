//! Wire types for the PhonePe pay-page API.
//!
//! Field names follow the provider's camelCase JSON exactly; keep the
//! serde renames in sync with the gateway docs.

use serde::{Deserialize, Serialize};

/// Order creation payload, base64-encoded before transport.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    /// Minor units.
    pub amount: i64,
    pub redirect_url: String,
    pub redirect_mode: String,
    pub callback_url: String,
    pub payment_instrument: PaymentInstrument,
}

#[derive(Debug, Serialize)]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub kind: String,
}

impl PaymentInstrument {
    pub fn pay_page() -> Self {
        Self {
            kind: "PAY_PAGE".to_string(),
        }
    }
}

/// The actual HTTP body: the signed payload rides in `request`.
#[derive(Debug, Serialize)]
pub struct WireEnvelope {
    pub request: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<PayResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponseData {
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentResponse {
    #[serde(default)]
    pub redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInfo {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub merchant_transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub response_code: Option<String>,
}
