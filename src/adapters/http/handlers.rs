//! HTTP handlers wiring axum routes to the application layer.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    CheckStatusError, CheckStatusHandler, CreateOrderError, CreateOrderHandler,
    ProcessWebhookError, ProcessWebhookHandler,
};
use crate::domain::foundation::{MerchantTransactionId, ValidationError};
use crate::domain::signature::SignatureCodec;
use crate::domain::subscription::SubscriptionLifecycle;
use crate::domain::webhook::WebhookError;
use crate::ports::{Clock, GatewayClient, OrderStore, StoreError};

use super::dto::{
    CreatePayRequest, CreatePayResponse, ErrorResponse, HealthResponse, StatusRequest,
    StatusResponse, WebhookAck,
};

/// Config facts surfaced by the health endpoint.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub environment: String,
    pub gateway_mode: String,
    pub merchant_id: String,
}

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub gateway: Arc<dyn GatewayClient>,
    pub lifecycle: Arc<SubscriptionLifecycle>,
    pub clock: Arc<dyn Clock>,
    pub codec: SignatureCodec,
    pub webhook_path: String,
    pub health: HealthSnapshot,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.orders.clone(), self.gateway.clone(), self.clock.clone())
    }

    pub fn check_status_handler(&self) -> CheckStatusHandler {
        CheckStatusHandler::new(
            self.orders.clone(),
            self.gateway.clone(),
            self.lifecycle.clone(),
            self.clock.clone(),
        )
    }

    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.orders.clone(),
            self.lifecycle.clone(),
            self.codec.clone(),
            self.webhook_path.clone(),
            self.clock.clone(),
        )
    }
}

/// Error type mapping every failure onto the API's envelope.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    SignatureInvalid,
    GatewayRejected { code: String, message: String },
    GatewayUnavailable,
    NotFound(String),
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::SignatureInvalid => {
                (StatusCode::BAD_REQUEST, "Invalid signature".to_string())
            }
            Self::GatewayRejected { code, message } => (
                StatusCode::BAD_REQUEST,
                format!("Payment gateway rejected the request: {code}: {message}"),
            ),
            Self::GatewayUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Payment gateway is unavailable, please retry".to_string(),
            ),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::Internal(message) => {
                tracing::error!(%message, "internal error serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CreateOrderError> for ApiError {
    fn from(err: CreateOrderError) -> Self {
        match err {
            CreateOrderError::Validation(e) => Self::Validation(e.to_string()),
            CreateOrderError::Rejected { code, message, .. } => {
                Self::GatewayRejected { code, message }
            }
            CreateOrderError::Unavailable { .. } => Self::GatewayUnavailable,
            CreateOrderError::Store(StoreError::DuplicateTransaction(mtid)) => {
                Self::Validation(format!("duplicate transaction: {mtid}"))
            }
            CreateOrderError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<CheckStatusError> for ApiError {
    fn from(err: CheckStatusError) -> Self {
        match err {
            CheckStatusError::NotFound(mtid) => {
                Self::NotFound(format!("payment not found: {mtid}"))
            }
            CheckStatusError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ProcessWebhookError> for ApiError {
    fn from(err: ProcessWebhookError) -> Self {
        match err {
            ProcessWebhookError::SignatureInvalid => Self::SignatureInvalid,
            ProcessWebhookError::Malformed(WebhookError::MalformedEnvelope(e)) => {
                Self::Validation(format!("malformed webhook body: {e}"))
            }
            ProcessWebhookError::Malformed(e) => Self::Validation(e.to_string()),
            ProcessWebhookError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

/// POST /pay - create a payment order and get the redirect URL
pub async fn create_pay(
    State(state): State<AppState>,
    Json(request): Json<CreatePayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = request.into_draft()?;
    let handler = state.create_order_handler();
    let result = handler.handle(draft).await?;
    Ok(Json(CreatePayResponse::from(result)))
}

/// POST /status - poll a payment against the provider
pub async fn check_status(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mtid = MerchantTransactionId::new(request.merchant_transaction_id)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let handler = state.check_status_handler();
    let report = handler.handle(&mtid).await?;
    Ok(Json(StatusResponse::from(report)))
}

/// POST /webhook - provider callback, signature verified
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("X-VERIFY")
        .and_then(|value| value.to_str().ok());

    let handler = state.process_webhook_handler();
    // Processed, Duplicate, and Ignored all acknowledge identically.
    handler.handle(&body, signature).await?;
    Ok(Json(WebhookAck { success: true }))
}

/// GET /health - liveness plus a config snapshot
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        environment: state.health.environment.clone(),
        gateway_mode: state.health.gateway_mode.clone(),
        merchant_id: state.health.merchant_id.clone(),
    })
}
