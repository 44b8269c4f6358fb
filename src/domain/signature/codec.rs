//! Request signing and webhook verification.
//!
//! The provider covers every call with an `X-VERIFY` header of the form
//! `<hex digest>###<key index>`. Two digest constructions are supported:
//! the legacy salt concatenation (SHA-256 over payload + path + salt) and
//! a keyed HMAC over payload + path.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Which digest construction signs and verifies traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// HMAC-SHA256 keyed with the salt, over `payload + path`.
    HmacSha256,
    /// Legacy: SHA-256 over `payload + path + salt`.
    Sha256Concat,
}

/// Parsed `X-VERIFY` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub digest_hex: String,
    pub key_index: String,
}

impl SignatureHeader {
    /// Splits `<digest>###<index>`. Returns None when either part is
    /// missing or empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (digest, index) = raw.split_once("###")?;
        if digest.is_empty() || index.is_empty() {
            return None;
        }
        Some(Self {
            digest_hex: digest.to_string(),
            key_index: index.to_string(),
        })
    }
}

/// Signs outbound requests and verifies inbound webhooks.
#[derive(Clone)]
pub struct SignatureCodec {
    scheme: SignatureScheme,
    secret: SecretString,
    key_index: u8,
}

impl SignatureCodec {
    pub fn new(scheme: SignatureScheme, secret: SecretString, key_index: u8) -> Self {
        Self {
            scheme,
            secret,
            key_index,
        }
    }

    /// Base64-encodes a JSON request body for transport.
    pub fn encode_payload(&self, json: &[u8]) -> String {
        BASE64.encode(json)
    }

    /// Decodes a base64 payload back to its JSON bytes.
    pub fn decode_payload(&self, encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(encoded)
    }

    /// Produces the `X-VERIFY` value for a request.
    ///
    /// For bodyless calls such as the status check, pass an empty payload
    /// and the full request path.
    pub fn sign(&self, base64_payload: &str, path: &str) -> String {
        let digest = self.digest(base64_payload, path);
        format!("{}###{}", hex::encode(digest), self.key_index)
    }

    /// Verifies an inbound `X-VERIFY` header against the payload it covers.
    ///
    /// Digest comparison is constant-time. A key index that differs from
    /// the configured one is noted but does not fail verification on its
    /// own; the digest decides.
    pub fn verify(&self, base64_payload: &str, path: &str, header: &str) -> bool {
        let Some(parsed) = SignatureHeader::parse(header) else {
            return false;
        };
        let Ok(claimed) = hex::decode(&parsed.digest_hex) else {
            return false;
        };

        if parsed.key_index != self.key_index.to_string() {
            tracing::warn!(
                claimed_index = %parsed.key_index,
                configured_index = self.key_index,
                "webhook signed with unexpected key index"
            );
        }

        let expected = self.digest(base64_payload, path);
        claimed.ct_eq(&expected).into()
    }

    fn digest(&self, base64_payload: &str, path: &str) -> Vec<u8> {
        match self.scheme {
            SignatureScheme::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
                    .expect("HMAC accepts keys of any length");
                mac.update(base64_payload.as_bytes());
                mac.update(path.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            SignatureScheme::Sha256Concat => {
                let mut hasher = Sha256::new();
                hasher.update(base64_payload.as_bytes());
                hasher.update(path.as_bytes());
                hasher.update(self.secret.expose_secret().as_bytes());
                hasher.finalize().to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec(scheme: SignatureScheme) -> SignatureCodec {
        SignatureCodec::new(scheme, SecretString::new("test-salt".to_string()), 1)
    }

    // ---- header parsing ----

    #[test]
    fn parses_well_formed_header() {
        let header = SignatureHeader::parse("abc123###2").unwrap();
        assert_eq!(header.digest_hex, "abc123");
        assert_eq!(header.key_index, "2");
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(SignatureHeader::parse("no-separator").is_none());
        assert!(SignatureHeader::parse("###1").is_none());
        assert!(SignatureHeader::parse("abc###").is_none());
        assert!(SignatureHeader::parse("").is_none());
    }

    // ---- known vectors ----

    #[test]
    fn concat_scheme_matches_known_vector() {
        let codec = codec(SignatureScheme::Sha256Concat);
        let payload = "eyJtZXJjaGFudElkIjoiTTEiLCJhbW91bnQiOjQ5OTAwfQ==";
        assert_eq!(
            codec.sign(payload, "/pg/v1/pay"),
            "a3d46e6be00cd48485978170e9772327cf631c04675089ba82009bb26215818f###1"
        );
    }

    #[test]
    fn hmac_scheme_matches_known_vector() {
        let codec = codec(SignatureScheme::HmacSha256);
        let payload = "eyJtZXJjaGFudElkIjoiTTEiLCJhbW91bnQiOjQ5OTAwfQ==";
        assert_eq!(
            codec.sign(payload, "/pg/v1/pay"),
            "b5314cb2f8f3855712c2061f89276d585c2ceba5673e10ecd3bdd25d96a20aaa###1"
        );
    }

    #[test]
    fn bodyless_status_call_signs_path_only() {
        let codec = codec(SignatureScheme::Sha256Concat);
        assert_eq!(
            codec.sign("", "/pg/v1/status/M1/MT1"),
            "1a608120599a143c3e94f8346d0df79309bdea80a962ccde14f86905686ca4e6###1"
        );
    }

    // ---- verification ----

    #[test]
    fn sign_then_verify_roundtrips_both_schemes() {
        for scheme in [SignatureScheme::HmacSha256, SignatureScheme::Sha256Concat] {
            let codec = codec(scheme);
            let payload = codec.encode_payload(br#"{"event":"payment.captured"}"#);
            let header = codec.sign(&payload, "/webhook");
            assert!(codec.verify(&payload, "/webhook", &header));
        }
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let codec = codec(SignatureScheme::Sha256Concat);
        let payload = codec.encode_payload(br#"{"amount":100}"#);
        let header = codec.sign(&payload, "/webhook");
        let tampered = codec.encode_payload(br#"{"amount":999}"#);
        assert!(!codec.verify(&tampered, "/webhook", &header));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let signer = codec(SignatureScheme::HmacSha256);
        let other = SignatureCodec::new(
            SignatureScheme::HmacSha256,
            SecretString::new("other-salt".to_string()),
            1,
        );
        let payload = signer.encode_payload(b"{}");
        let header = signer.sign(&payload, "/webhook");
        assert!(!other.verify(&payload, "/webhook", &header));
    }

    #[test]
    fn mismatched_key_index_alone_still_verifies() {
        let signer = codec(SignatureScheme::Sha256Concat);
        let verifier = SignatureCodec::new(
            SignatureScheme::Sha256Concat,
            SecretString::new("test-salt".to_string()),
            2,
        );
        let payload = signer.encode_payload(b"{}");
        let header = signer.sign(&payload, "/webhook");
        assert!(verifier.verify(&payload, "/webhook", &header));
    }

    #[test]
    fn malformed_header_fails_closed() {
        let codec = codec(SignatureScheme::Sha256Concat);
        let payload = codec.encode_payload(b"{}");
        assert!(!codec.verify(&payload, "/webhook", "not-a-signature"));
        assert!(!codec.verify(&payload, "/webhook", "zzzz###1"));
        assert!(!codec.verify(&payload, "/webhook", ""));
    }

    #[test]
    fn payload_encoding_roundtrips() {
        let codec = codec(SignatureScheme::Sha256Concat);
        let json = br#"{"merchantId":"M1"}"#;
        let encoded = codec.encode_payload(json);
        assert_eq!(codec.decode_payload(&encoded).unwrap(), json);
    }

    proptest! {
        #[test]
        fn any_payload_roundtrips(payload in any::<Vec<u8>>(), path in "/[a-z/]{0,20}") {
            let codec = codec(SignatureScheme::HmacSha256);
            let encoded = codec.encode_payload(&payload);
            let header = codec.sign(&encoded, &path);
            prop_assert!(codec.verify(&encoded, &path, &header));
        }

        #[test]
        fn single_hex_digit_mutation_fails(
            payload in any::<Vec<u8>>(),
            pos in 0usize..64,
        ) {
            let codec = codec(SignatureScheme::Sha256Concat);
            let encoded = codec.encode_payload(&payload);
            let header = codec.sign(&encoded, "/webhook");
            let mut bytes: Vec<u8> = header.into_bytes();
            bytes[pos] = if bytes[pos] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();
            prop_assert!(!codec.verify(&encoded, "/webhook", &mutated));
        }
    }
}
