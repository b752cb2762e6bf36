//! Embedded key boundary.
//!
//! Contract target:
//! - turn the `jwk` header parameter into a verifying key
//! - algorithm/key consistency checks
//! - no signature verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult};
use crate::types::Header;

/// Algorithms accepted in the `alg` header parameter.
pub(crate) const SUPPORTED_ALGORITHMS: &[&str] = &["EdDSA", "Ed25519"];

/// Extract the embedded Ed25519 verifying key from a protected header.
pub(crate) fn embedded_key(header: &Header) -> DecodeResult<VerifyingKey> {
    let alg = header
        .alg()
        .ok_or_else(|| DecodeError::signature("missing \"alg\" header parameter"))?;

    if !SUPPORTED_ALGORITHMS.contains(&alg) {
        return Err(DecodeError::signature(format!(
            "unsupported algorithm: {}",
            alg
        )));
    }

    let jwk = match header.jwk() {
        Some(Value::Object(jwk)) => jwk,
        Some(_) => return Err(DecodeError::signature("\"jwk\" header parameter must be an object")),
        None => return Err(DecodeError::signature("missing embedded \"jwk\" header parameter")),
    };

    check_public_jwk(jwk, alg)?;
    decode_okp_key(jwk)
}

fn check_public_jwk(jwk: &Map<String, Value>, alg: &str) -> DecodeResult<()> {
    if jwk.contains_key("d") {
        return Err(DecodeError::signature(
            "embedded \"jwk\" must be a public key",
        ));
    }

    if let Some(jwk_alg) = jwk.get("alg") {
        if jwk_alg.as_str() != Some(alg) {
            return Err(DecodeError::signature(format!(
                "embedded key algorithm {} does not match header algorithm {}",
                jwk_alg, alg
            )));
        }
    }

    if let Some(key_use) = jwk.get("use") {
        if key_use.as_str() != Some("sig") {
            return Err(DecodeError::signature(format!(
                "embedded key use {} is not \"sig\"",
                key_use
            )));
        }
    }

    if let Some(key_ops) = jwk.get("key_ops") {
        let allows_verify = key_ops
            .as_array()
            .is_some_and(|ops| ops.iter().any(|op| op.as_str() == Some("verify")));
        if !allows_verify {
            return Err(DecodeError::signature(
                "embedded key \"key_ops\" does not allow verify",
            ));
        }
    }

    Ok(())
}

fn decode_okp_key(jwk: &Map<String, Value>) -> DecodeResult<VerifyingKey> {
    let member = |name: &str| jwk.get(name).and_then(Value::as_str);

    match member("kty") {
        Some("OKP") => {}
        Some(other) => {
            return Err(DecodeError::signature(format!(
                "unsupported embedded key type: {}",
                other
            )))
        }
        None => return Err(DecodeError::signature("embedded key has no \"kty\"")),
    }

    match member("crv") {
        Some("Ed25519") => {}
        Some(other) => {
            return Err(DecodeError::signature(format!(
                "unsupported embedded key curve: {}",
                other
            )))
        }
        None => return Err(DecodeError::signature("embedded key has no \"crv\"")),
    }

    let x = member("x").ok_or_else(|| DecodeError::signature("embedded key has no \"x\""))?;
    let bytes = BASE64URL
        .decode(x)
        .map_err(|e| DecodeError::signature(format!("invalid embedded key encoding: {}", e)))?;

    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        DecodeError::signature(format!(
            "embedded key must be {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            bytes.len()
        ))
    })?;

    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| DecodeError::signature(format!("invalid embedded key: {}", e)))
}
