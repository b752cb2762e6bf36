//! Token minting for unit tests. The library itself never produces tokens.
//!
//! Mirrors `tests/common/mod.rs`; the two must mint identical tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};

pub(crate) fn signing_key() -> SigningKey {
    SigningKey::generate(&mut rand::thread_rng())
}

pub(crate) fn embedded_jwk(key: &SigningKey) -> Value {
    json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "x": BASE64URL.encode(key.verifying_key().as_bytes()),
    })
}

pub(crate) fn protected_header(key: &SigningKey) -> Value {
    json!({"alg": "EdDSA", "typ": "JWT", "jwk": embedded_jwk(key)})
}

/// Sign `payload` with `key`, embedding the public key in the header.
pub(crate) fn sign_bytes(key: &SigningKey, payload: &[u8]) -> String {
    sign_with_header(key, &protected_header(key), payload)
}

pub(crate) fn sign_json(key: &SigningKey, payload: &Value) -> String {
    sign_bytes(key, &serde_json::to_vec(payload).unwrap())
}

/// Sign with an arbitrary protected header (which may or may not embed `key`).
pub(crate) fn sign_with_header(key: &SigningKey, header: &Value, payload: &[u8]) -> String {
    let signing_input = format!(
        "{}.{}",
        BASE64URL.encode(serde_json::to_vec(header).unwrap()),
        BASE64URL.encode(payload)
    );
    let signature = key.sign(signing_input.as_bytes());
    format!("{}.{}", signing_input, BASE64URL.encode(signature.to_bytes()))
}
