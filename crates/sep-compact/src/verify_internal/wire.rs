//! Wire-format boundary for compact token verification.
//!
//! Contract target:
//! - segment split, base64url decoding and header shape checks only
//! - no key handling
//! - no cryptographic verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::types::Header;

/// Segments of a compact token, plus their decoded bytes.
#[derive(Debug)]
pub(crate) struct CompactToken<'a> {
    /// `BASE64URL(header) || '.' || BASE64URL(payload)`, the signed bytes.
    pub(crate) signing_input: &'a str,
    pub(crate) header: Header,
    pub(crate) payload: Vec<u8>,
    pub(crate) signature: Vec<u8>,
}

/// Split and decode a compact token.
///
/// Surrounding ASCII whitespace (a trailing newline in a stored file) is
/// ignored; anything else that is not three unpadded base64url segments is
/// rejected.
pub(crate) fn parse_compact(raw: &[u8]) -> DecodeResult<CompactToken<'_>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| DecodeError::signature(format!("token is not UTF-8: {}", e)))?
        .trim_matches(|c: char| c.is_ascii_whitespace());

    let segments: Vec<&str> = text.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::signature(format!(
            "compact token must have 3 segments, got {}",
            segments.len()
        )));
    }

    let (header_b64, payload_b64, signature_b64) = (segments[0], segments[1], segments[2]);
    if header_b64.is_empty() {
        return Err(DecodeError::signature("empty protected header segment"));
    }
    if signature_b64.is_empty() {
        return Err(DecodeError::signature("empty signature segment"));
    }

    let header = parse_protected_header(&decode_segment("protected header", header_b64)?)?;
    let payload = decode_segment("payload", payload_b64)?;
    let signature = decode_segment("signature", signature_b64)?;

    Ok(CompactToken {
        signing_input: &text[..header_b64.len() + 1 + payload_b64.len()],
        header,
        payload,
        signature,
    })
}

pub(crate) fn decode_segment(name: &str, segment: &str) -> DecodeResult<Vec<u8>> {
    BASE64URL
        .decode(segment)
        .map_err(|e| DecodeError::signature(format!("invalid base64url {}: {}", name, e)))
}

/// Decode the protected header and check the parameters this verifier
/// relies on.
fn parse_protected_header(bytes: &[u8]) -> DecodeResult<Header> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::signature(format!("invalid protected header JSON: {}", e)))?;

    let Value::Object(params) = value else {
        return Err(DecodeError::signature(
            "protected header is not a JSON object",
        ));
    };
    let header = Header::new(params);

    match header.get("alg") {
        Some(Value::String(alg)) if alg == "none" => {
            return Err(DecodeError::signature("unsecured tokens (alg none) rejected"));
        }
        Some(Value::String(_)) => {}
        Some(_) => return Err(DecodeError::signature("\"alg\" must be a string")),
        None => return Err(DecodeError::signature("missing \"alg\" header parameter")),
    }

    // No extensions are understood, so any critical one must be refused.
    if header.get("crit").is_some() {
        return Err(DecodeError::signature(
            "unsupported critical header parameters",
        ));
    }

    if header.get("b64") == Some(&Value::Bool(false)) {
        return Err(DecodeError::signature("unencoded payloads are not supported"));
    }

    Ok(header)
}
