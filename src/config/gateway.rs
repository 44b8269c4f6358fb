//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::signature::{SignatureCodec, SignatureScheme};

use super::error::ValidationError;
use super::server::Environment;

/// Which gateway implementation serves orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    #[default]
    Real,
    Mock,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Mock => "mock",
        }
    }
}

/// Payment gateway configuration (PhonePe)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant id issued by the provider
    #[serde(default)]
    pub merchant_id: String,

    /// Shared salt key used for request signing
    #[serde(default = "default_salt_key")]
    pub salt_key: SecretString,

    /// Which salt key is active on the provider side
    #[serde(default = "default_salt_index")]
    pub salt_index: u8,

    /// Provider API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Digest construction used for signing and verification
    #[serde(default = "default_scheme")]
    pub scheme: SignatureScheme,

    /// Real provider or the deterministic mock
    #[serde(default)]
    pub mode: GatewayMode,

    /// Fall back to the mock when the real provider is unreachable
    #[serde(default)]
    pub mock_fallback: bool,

    /// Where the provider sends the user after payment
    #[serde(default)]
    pub redirect_url: String,

    /// Where the provider posts webhooks
    #[serde(default)]
    pub callback_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the signature codec this configuration describes.
    pub fn codec(&self) -> SignatureCodec {
        SignatureCodec::new(self.scheme, self.salt_key.clone(), self.salt_index)
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.mode == GatewayMode::Real || self.mock_fallback {
            if self.merchant_id.is_empty() {
                return Err(ValidationError::MissingRequired("GATEWAY_MERCHANT_ID"));
            }
            if self.salt_key.expose_secret().is_empty() {
                return Err(ValidationError::MissingRequired("GATEWAY_SALT_KEY"));
            }
        }
        if self.salt_index == 0 {
            return Err(ValidationError::InvalidSaltIndex);
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        if *environment == Environment::Production && self.mode == GatewayMode::Mock {
            return Err(ValidationError::MockGatewayInProduction);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            salt_key: default_salt_key(),
            salt_index: default_salt_index(),
            base_url: default_base_url(),
            scheme: default_scheme(),
            mode: GatewayMode::default(),
            mock_fallback: false,
            redirect_url: String::new(),
            callback_url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_salt_key() -> SecretString {
    SecretString::new(String::new())
}

fn default_salt_index() -> u8 {
    1
}

fn default_base_url() -> String {
    "https://api.phonepe.com/apis/hermes".to_string()
}

fn default_scheme() -> SignatureScheme {
    SignatureScheme::Sha256Concat
}

fn default_timeout() -> u64 {
    30
}
