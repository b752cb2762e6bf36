//! Envelope types and configuration.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the three claim fields of a SEP-001 Compact payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimField {
    S,
    D,
    T,
}

impl ClaimField {
    /// All claim fields, in payload order.
    pub const ALL: [ClaimField; 3] = [ClaimField::S, ClaimField::D, ClaimField::T];

    /// JSON member name of the claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "s",
            Self::D => "d",
            Self::T => "t",
        }
    }
}

impl fmt::Display for ClaimField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root block bytes: a compact token `header.payload.signature`, not yet
/// verified.
pub type RawToken = Bytes;

/// Verified protected header of a compact token.
///
/// The shape is protocol-defined; it is passed through to the caller
/// unmodified. Accessors cover the parameters the verifier relies on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(Map<String, Value>);

impl Header {
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    /// `alg` parameter.
    pub fn alg(&self) -> Option<&str> {
        self.get_str("alg")
    }

    /// `typ` parameter.
    pub fn typ(&self) -> Option<&str> {
        self.get_str("typ")
    }

    /// `kid` parameter.
    pub fn kid(&self) -> Option<&str> {
        self.get_str("kid")
    }

    /// Embedded `jwk` parameter.
    pub fn jwk(&self) -> Option<&Value> {
        self.0.get("jwk")
    }

    /// Raw parameter lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

/// Decoded JSON body of a verified token.
///
/// Expected to carry `s`, `d` and `t` as content identifier strings; the
/// claims resolver enforces that.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(Map<String, Value>);

impl RawPayload {
    pub fn new(members: Map<String, Value>) -> Self {
        Self(members)
    }

    /// Value of a claim field, if present.
    pub fn claim(&self, field: ClaimField) -> Option<&Value> {
        self.0.get(field.as_str())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A dereferenced claim document. Its schema is the caller's concern.
pub type Claim = Value;

/// The three resolved claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub s: Claim,
    pub d: Claim,
    pub t: Claim,
}

impl Payload {
    /// Claim by field.
    pub fn get(&self, field: ClaimField) -> &Claim {
        match field {
            ClaimField::S => &self.s,
            ClaimField::D => &self.d,
            ClaimField::T => &self.t,
        }
    }
}

/// A fully decoded and verified envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEnvelope {
    /// Verified protected header.
    pub header: Header,

    /// Resolved claims.
    pub payload: Payload,
}

/// Output of signature verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    /// Verified protected header.
    pub header: Header,

    /// Parsed payload.
    pub payload: RawPayload,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway (content is served under `/ipfs/{cid}`).
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Bearer token for authenticated gateways.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl GatewayConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SEP_GATEWAY_URL` | Gateway base URL |
    /// | `SEP_GATEWAY_TOKEN` | Bearer token |
    /// | `SEP_GATEWAY_TIMEOUT` | Request timeout in seconds |
    /// | `SEP_GATEWAY_MAX_RETRIES` | Max retries for transient failures |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SEP_GATEWAY_URL").unwrap_or_else(|_| default_gateway_url()),
            token: std::env::var("SEP_GATEWAY_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("SEP_GATEWAY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("SEP_GATEWAY_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout in seconds. Must be non-zero.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Safeguards applied to every fetched block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Largest accepted block, in bytes.
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,

    /// Check raw sha2-256 blocks against their identifier.
    #[serde(default = "default_verify_raw_blocks")]
    pub verify_raw_blocks: bool,
}

/// Default block size limit (4 MiB).
pub(crate) const DEFAULT_MAX_BLOCK_SIZE: usize = 4 * 1024 * 1024;

fn default_max_block_size() -> usize {
    DEFAULT_MAX_BLOCK_SIZE
}

fn default_verify_raw_blocks() -> bool {
    true
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_block_size: default_max_block_size(),
            verify_raw_blocks: default_verify_raw_blocks(),
        }
    }
}

impl FetchOptions {
    /// Create options from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SEP_MAX_BLOCK_SIZE` | Largest accepted block in bytes |
    /// | `SEP_VERIFY_RAW_BLOCKS` | `0`/`false` disables raw block digest checks |
    pub fn from_env() -> Self {
        Self {
            max_block_size: std::env::var("SEP_MAX_BLOCK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_block_size),
            verify_raw_blocks: std::env::var("SEP_VERIFY_RAW_BLOCKS")
                .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
                .unwrap_or_else(|_| default_verify_raw_blocks()),
        }
    }

    /// Set the block size limit.
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    /// Toggle raw block digest checks.
    pub fn with_verify_raw_blocks(mut self, verify: bool) -> Self {
        self.verify_raw_blocks = verify;
        self
    }
}
