//! Token verification (embedded-key compact signatures).
//!
//! A root block is a compact serialized token
//! `BASE64URL(header).BASE64URL(payload).BASE64URL(signature)` whose
//! protected header carries the public key (`jwk`) that signed it. Trust is
//! self-certifying: a valid token proves the payload came from the key
//! inside it, not that the key is known in advance.
//!
//! Verification fails closed:
//! 1. Parse the three segments and the protected header
//! 2. Extract the embedded Ed25519 key
//! 3. Verify the signature over `segment0.segment1`
//! 4. Only then decode the payload as UTF-8 JSON

use ed25519_dalek::Signature;
use serde_json::Value;
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::types::{RawPayload, VerifiedToken};
use crate::verify_internal::jwk::{embedded_key, SUPPORTED_ALGORITHMS};
use crate::verify_internal::wire::parse_compact;

/// Signature verification capability.
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token and return its header and payload.
    fn verify(&self, token: &[u8]) -> DecodeResult<VerifiedToken>;
}

/// Verifies tokens against the key embedded in their own header.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedJwkVerifier;

impl EmbeddedJwkVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Algorithms this verifier accepts.
    pub fn supported_algorithms() -> &'static [&'static str] {
        SUPPORTED_ALGORITHMS
    }
}

impl TokenVerifier for EmbeddedJwkVerifier {
    fn verify(&self, token: &[u8]) -> DecodeResult<VerifiedToken> {
        verify_compact(token)
    }
}

/// Verify an embedded-key compact token.
pub fn verify_compact(token: &[u8]) -> DecodeResult<VerifiedToken> {
    let parsed = parse_compact(token)?;
    let key = embedded_key(&parsed.header)?;

    let signature = Signature::from_slice(&parsed.signature)
        .map_err(|e| DecodeError::signature(format!("invalid signature bytes: {}", e)))?;

    key.verify_strict(parsed.signing_input.as_bytes(), &signature)
        .map_err(|_| DecodeError::signature("ed25519 verification failed"))?;

    debug!(alg = parsed.header.alg().unwrap_or_default(), "token signature verified");

    let payload = parse_payload(&parsed.payload)?;
    Ok(VerifiedToken {
        header: parsed.header,
        payload,
    })
}

/// Decode verified payload bytes. Must only be called after the signature
/// check succeeded.
fn parse_payload(bytes: &[u8]) -> DecodeResult<RawPayload> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::payload(format!("payload is not UTF-8: {}", e)))?;

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(members)) => Ok(RawPayload::new(members)),
        Ok(_) => Err(DecodeError::payload("payload is not a JSON object")),
        Err(e) => Err(DecodeError::payload(format!("payload is not JSON: {}", e))),
    }
}
