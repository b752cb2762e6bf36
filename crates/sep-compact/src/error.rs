//! Error types for envelope decoding.

use std::fmt;

use crate::types::ClaimField;

/// Decode errors.
///
/// Every variant is fatal to the decode call that produced it; there is no
/// partial result.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Content identifier could not be resolved by the store.
    #[error("content not found: {cid}")]
    NotFound { cid: String },

    /// Transport or node failure unrelated to content existence.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Token is malformed or its embedded-key signature does not verify.
    #[error("signature verification failed: {reason}")]
    SignatureVerification { reason: String },

    /// Verified payload is not UTF-8 JSON.
    #[error("invalid payload: {reason}")]
    PayloadFormat { reason: String },

    /// One or more of `s`, `d`, `t` absent from the payload.
    #[error("missing claim(s): {}", join_fields(.fields))]
    MissingClaim { fields: Vec<ClaimField> },

    /// Claim value is not a parseable content identifier.
    #[error("invalid content identifier in claim '{field}': {value} - {reason}")]
    InvalidClaimId {
        field: ClaimField,
        value: String,
        reason: String,
    },

    /// Dereferenced claim document is not UTF-8 JSON.
    #[error("claim '{field}' ({cid}) is not valid JSON: {reason}")]
    ClaimFormat {
        field: ClaimField,
        cid: String,
        reason: String,
    },

    /// Root content identifier supplied as text did not parse.
    #[error("invalid root content identifier: {value} - {reason}")]
    InvalidRootId { value: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Stable error classification, independent of the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Storage,
    SignatureVerification,
    PayloadFormat,
    MissingClaim,
    InvalidClaimId,
    ClaimFormat,
    InvalidRootId,
    Config,
}

impl DecodeError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::SignatureVerification { .. } => ErrorKind::SignatureVerification,
            Self::PayloadFormat { .. } => ErrorKind::PayloadFormat,
            Self::MissingClaim { .. } => ErrorKind::MissingClaim,
            Self::InvalidClaimId { .. } => ErrorKind::InvalidClaimId,
            Self::ClaimFormat { .. } => ErrorKind::ClaimFormat,
            Self::InvalidRootId { .. } => ErrorKind::InvalidRootId,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// The claim that triggered the error, if the error is claim-specific.
    ///
    /// For `MissingClaim` this is the first missing field.
    pub fn claim_field(&self) -> Option<ClaimField> {
        match self {
            Self::MissingClaim { fields } => fields.first().copied(),
            Self::InvalidClaimId { field, .. } | Self::ClaimFormat { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Whether retrying the whole decode could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub(crate) fn signature(reason: impl Into<String>) -> Self {
        Self::SignatureVerification {
            reason: reason.into(),
        }
    }

    pub(crate) fn payload(reason: impl Into<String>) -> Self {
        Self::PayloadFormat {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::SignatureVerification => "signature_verification",
            Self::PayloadFormat => "payload_format",
            Self::MissingClaim => "missing_claim",
            Self::InvalidClaimId => "invalid_claim_id",
            Self::ClaimFormat => "claim_format",
            Self::InvalidRootId => "invalid_root_id",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

fn join_fields(fields: &[ClaimField]) -> String {
    fields
        .iter()
        .map(ClaimField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<reqwest::Error> for DecodeError {
    fn from(err: reqwest::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
