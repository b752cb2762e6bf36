//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. gateway/mod.rs never
//! interprets status codes.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::error::{DecodeError, DecodeResult};

use super::helpers::{backoff_delay, parse_block_url, parse_retry_after};

/// Most bytes of an error response body kept for the error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Failed attempt, classified for the retry loop.
#[derive(Debug)]
enum Attempt {
    /// Transient; may succeed on retry.
    Retryable {
        error: DecodeError,
        retry_after: Option<Duration>,
    },

    /// Permanent for this request.
    Fatal(DecodeError),
}

impl Attempt {
    fn transient(message: String) -> Self {
        Self::Retryable {
            error: DecodeError::storage(message),
            retry_after: None,
        }
    }
}

/// HTTP backend for making requests (holds reqwest client, auth, retry budget).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token_provider: TokenProvider,
    pub(crate) max_retries: u32,
    pub(crate) max_block_size: usize,
}

impl HttpBackend {
    /// GET a block body, retrying transient failures.
    ///
    /// The body is read chunk by chunk and never buffered past
    /// `max_block_size`.
    pub(crate) async fn fetch_block(&self, url: &str) -> DecodeResult<Bytes> {
        let mut response = self.request(url).await?;

        if let Some(declared) = response.content_length() {
            if declared > self.max_block_size as u64 {
                return Err(self.too_large(url, "declared"));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DecodeError::storage(format!("failed to read response body: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_block_size {
                return Err(self.too_large(url, "streamed"));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    fn too_large(&self, url: &str, how: &str) -> DecodeError {
        let cid = parse_block_url(url);
        warn!(
            cid = %cid,
            limit = self.max_block_size,
            how,
            "gateway body exceeds block size limit"
        );
        DecodeError::storage(format!(
            "block {} exceeds size limit of {} bytes",
            cid, self.max_block_size
        ))
    }

    async fn request(&self, url: &str) -> DecodeResult<reqwest::Response> {
        let mut retries = 0;

        loop {
            match self.request_once(url).await {
                Ok(response) => return Ok(response),
                Err(Attempt::Retryable { error, retry_after }) if retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_delay(retries, retry_after);

                    warn!(
                        error = %error,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying gateway request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(Attempt::Retryable { error, .. } | Attempt::Fatal(error)) => return Err(error),
            }
        }
    }

    async fn request_once(&self, url: &str) -> Result<reqwest::Response, Attempt> {
        let mut request = self.client.get(url);

        if let Some(token) = self.token_provider.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Attempt::transient(format!("request failed: {}", e)))?;
        let status = response.status();

        debug!(url = %url, status = status.as_u16(), "gateway response");

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => Err(Attempt::Fatal(DecodeError::storage(format!(
                "unauthorized (HTTP {})",
                status.as_u16()
            )))),

            404 | 410 => Err(Attempt::Fatal(DecodeError::NotFound {
                cid: parse_block_url(url),
            })),

            429 => Err(Attempt::Retryable {
                error: DecodeError::storage("rate limited (HTTP 429)"),
                retry_after: parse_retry_after(response.headers()),
            }),

            500..=599 => {
                let body = body_excerpt(response, status).await;
                Err(Attempt::transient(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body
                )))
            }

            _ => {
                let body = body_excerpt(response, status).await;
                Err(Attempt::Fatal(DecodeError::storage(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body
                ))))
            }
        }
    }
}

/// First bytes of an error body, falling back to the status text.
async fn body_excerpt(mut response: reqwest::Response, status: StatusCode) -> String {
    let mut excerpt = Vec::new();
    while excerpt.len() < BODY_EXCERPT_LEN {
        match response.chunk().await {
            Ok(Some(chunk)) => excerpt.extend_from_slice(&chunk),
            _ => break,
        }
    }
    excerpt.truncate(BODY_EXCERPT_LEN);

    if excerpt.is_empty() {
        status.to_string()
    } else {
        String::from_utf8_lossy(&excerpt).into_owned()
    }
}
