use thiserror::Error;

/// Failures while interpreting a verified webhook body.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook body is not a valid event envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),

    #[error("event '{kind}' is missing its entity payload")]
    MissingEntity { kind: String },

    #[error("event '{kind}' carries a malformed entity: {message}")]
    MalformedEntity { kind: String, message: String },
}
