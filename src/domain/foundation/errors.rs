//! Domain-level error types shared across modules.

use thiserror::Error;

/// Input validation failure on a domain value object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("amount must be a positive number of minor units, got {value}")]
    NonPositiveAmount { value: i64 },

    #[error("unknown billing cycle '{value}'")]
    UnknownBillingCycle { value: String },

    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ValidationError {
    pub fn empty_field(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
