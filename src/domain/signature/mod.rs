//! Signature construction and verification for provider traffic.

mod codec;

pub use codec::{SignatureCodec, SignatureHeader, SignatureScheme};
