//! Decoder for SEP-001 Compact envelopes.
//!
//! An envelope is a signed compact token stored on a content-addressed
//! network. Its payload names three further documents by content identifier
//! (`s`, `d`, `t`). Decoding:
//!
//! - Fetches the root token by CID
//! - Verifies its signature with the key embedded in the token
//! - Fetches and parses the three claim documents concurrently
//!
//! and yields the verified header together with the three documents, or a
//! single typed error.
//!
//! # Quick Start
//!
//! ```no_run
//! use sep_compact::{ContentId, Decoder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Gateway from SEP_GATEWAY_URL (default http://127.0.0.1:8080)
//! let decoder = Decoder::from_env()?;
//!
//! let root: ContentId = "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy".parse()?;
//! let envelope = decoder.decode(&root).await?;
//! println!("alg = {:?}", envelope.header.alg());
//! println!("s = {}", envelope.payload.s);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SEP_GATEWAY_URL` | Gateway base URL (default: `http://127.0.0.1:8080`) |
//! | `SEP_GATEWAY_TOKEN` | Bearer token for private gateways |
//! | `SEP_GATEWAY_TIMEOUT` | Request timeout in seconds, at least 1 (default: 30) |
//! | `SEP_GATEWAY_MAX_RETRIES` | Max retries for transient failures (default: 3) |
//! | `SEP_MAX_BLOCK_SIZE` | Largest accepted block in bytes (default: 4 MiB) |
//! | `SEP_VERIFY_RAW_BLOCKS` | Check raw blocks against their CID (default: on) |

pub mod auth;
pub mod claims;
pub mod content_id;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod store;
pub mod types;
pub mod verify;
mod verify_internal;

#[cfg(test)]
mod test_utils;

// Re-export main types
pub use auth::TokenProvider;
pub use claims::{claim_ids, ClaimsResolver};
pub use content_id::{CidError, ContentId};
pub use decoder::Decoder;
pub use error::{DecodeError, DecodeResult, ErrorKind};
pub use fetch::{verify_raw_block, Fetcher};
pub use gateway::{GatewayStore, GATEWAY_USER_AGENT};
pub use store::{ContentStore, MemoryStore};
pub use types::{
    Claim, ClaimField, DecodedEnvelope, FetchOptions, GatewayConfig, Header, Payload, RawPayload,
    RawToken, VerifiedToken,
};
pub use verify::{verify_compact, EmbeddedJwkVerifier, TokenVerifier};
