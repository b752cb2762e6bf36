//! HTTP gateway content store.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::content_id::ContentId;
use crate::error::{DecodeError, DecodeResult};
use crate::store::ContentStore;
use crate::types::{GatewayConfig, DEFAULT_MAX_BLOCK_SIZE};

mod helpers;
mod http;

use helpers::block_url;
use http::HttpBackend;

/// User agent for gateway requests.
pub const GATEWAY_USER_AGENT: &str = concat!("sep-compact/", env!("CARGO_PKG_VERSION"));

/// Content store backed by a path-style HTTP gateway (`GET /ipfs/{cid}`).
///
/// Response bodies larger than the block size limit (4 MiB unless set with
/// [`GatewayStore::with_max_block_size`]) are rejected while streaming.
#[derive(Debug, Clone)]
pub struct GatewayStore {
    http: HttpBackend,
}

impl GatewayStore {
    pub fn new(config: GatewayConfig) -> DecodeResult<Self> {
        let token_provider = config
            .token
            .as_ref()
            .map(TokenProvider::static_token)
            .unwrap_or_else(TokenProvider::from_env);

        Self::with_token_provider(config, token_provider)
    }

    pub fn with_token_provider(
        config: GatewayConfig,
        token_provider: TokenProvider,
    ) -> DecodeResult<Self> {
        if !(config.url.starts_with("http://") || config.url.starts_with("https://")) {
            return Err(DecodeError::Config {
                message: format!("gateway url must be http(s): {}", config.url),
            });
        }

        if config.timeout_secs == 0 {
            return Err(DecodeError::Config {
                message: "gateway timeout must be at least 1 second".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(GATEWAY_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| DecodeError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                token_provider,
                max_retries: config.max_retries,
                max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            },
        })
    }

    /// Set the largest response body accepted, in bytes.
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.http.max_block_size = max_block_size;
        self
    }

    pub fn from_env() -> DecodeResult<Self> {
        Self::new(GatewayConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.token_provider.is_authenticated()
    }

    pub fn max_block_size(&self) -> usize {
        self.http.max_block_size
    }
}

#[async_trait]
impl ContentStore for GatewayStore {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        let url = block_url(&self.http.base_url, cid);
        debug!(url = %url, "fetching block from gateway");

        self.http.fetch_block(&url).await
    }

    fn name(&self) -> &'static str {
        "gateway"
    }
}
