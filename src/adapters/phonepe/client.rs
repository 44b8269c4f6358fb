//! Real PhonePe gateway client.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::domain::payment::Payment;
use crate::domain::signature::SignatureCodec;
use crate::ports::{GatewayClient, GatewayError, OrderReceipt, ProviderState, ProviderStatus};

use super::types::{
    PayRequest, PayResponse, PaymentInstrument, StatusResponse, WireEnvelope,
};

const PAY_PATH: &str = "/pg/v1/pay";

pub struct PhonePeClient {
    http: reqwest::Client,
    config: GatewayConfig,
    codec: SignatureCodec,
}

impl PhonePeClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;
        let codec = config.codec();
        Ok(Self {
            http,
            config,
            codec,
        })
    }

    fn pay_request(&self, payment: &Payment) -> PayRequest {
        PayRequest {
            merchant_id: self.config.merchant_id.clone(),
            merchant_transaction_id: payment.merchant_transaction_id.to_string(),
            merchant_user_id: payment.user_id.to_string(),
            amount: payment.amount.minor_units(),
            redirect_url: self.config.redirect_url.clone(),
            redirect_mode: "REDIRECT".to_string(),
            callback_url: self.config.callback_url.clone(),
            payment_instrument: PaymentInstrument::pay_page(),
        }
    }

    fn map_transport_error(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() || err.is_connect() {
            GatewayError::Unavailable(err.to_string())
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl GatewayClient for PhonePeClient {
    async fn create_order(&self, payment: &Payment) -> Result<OrderReceipt, GatewayError> {
        let payload = serde_json::to_vec(&self.pay_request(payment))
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let encoded = self.codec.encode_payload(&payload);
        let signature = self.codec.sign(&encoded, PAY_PATH);

        let response = self
            .http
            .post(format!("{}{}", self.config.base_url, PAY_PATH))
            .header("X-VERIFY", signature)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .json(&WireEnvelope { request: encoded })
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!(
                "provider returned {status}"
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let parsed: PayResponse = serde_json::from_value(raw.clone())
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

        if !status.is_success() || !parsed.success {
            return Err(GatewayError::Rejected {
                code: parsed.code.unwrap_or_else(|| status.to_string()),
                message: parsed.message.unwrap_or_default(),
            });
        }

        let data = parsed
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("response has no data".to_string()))?;
        let redirect_url = data
            .instrument_response
            .and_then(|ir| ir.redirect_info)
            .map(|ri| ri.url)
            .ok_or_else(|| {
                GatewayError::InvalidResponse("response has no redirect url".to_string())
            })?;

        Ok(OrderReceipt {
            redirect_url,
            provider_transaction_id: data.transaction_id,
            via_mock: false,
            raw_response: raw,
        })
    }

    async fn check_status(&self, payment: &Payment) -> Result<ProviderStatus, GatewayError> {
        let path = format!(
            "/pg/v1/status/{}/{}",
            self.config.merchant_id, payment.merchant_transaction_id
        );
        // Status calls carry no body; the digest covers the path alone.
        let signature = self.codec.sign("", &path);

        let response = self
            .http
            .get(format!("{}{}", self.config.base_url, path))
            .header("X-VERIFY", signature)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!(
                "provider returned {status}"
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let parsed: StatusResponse = serde_json::from_value(raw.clone())
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                code: parsed.code.unwrap_or_else(|| status.to_string()),
                message: parsed.message.unwrap_or_default(),
            });
        }

        let data = parsed.data;
        let state = map_state(
            data.as_ref().and_then(|d| d.state.as_deref()),
            parsed.code.as_deref(),
        );

        Ok(ProviderStatus {
            state,
            provider_transaction_id: data.as_ref().and_then(|d| d.transaction_id.clone()),
            response_code: data
                .as_ref()
                .and_then(|d| d.response_code.clone())
                .or(parsed.code),
            raw_response: raw,
        })
    }
}

/// Maps the provider's state/code vocabulary onto our three states.
/// Anything unrecognized stays pending so polling can try again.
fn map_state(state: Option<&str>, code: Option<&str>) -> ProviderState {
    match (state, code) {
        (Some("COMPLETED"), _) | (Some("SUCCESS"), _) | (_, Some("PAYMENT_SUCCESS")) => {
            ProviderState::Completed
        }
        (Some("FAILED"), _) | (_, Some("PAYMENT_ERROR")) | (_, Some("PAYMENT_DECLINED")) => {
            ProviderState::Failed
        }
        _ => ProviderState::Pending,
    }
}
