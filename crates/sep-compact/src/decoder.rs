//! Envelope decoding.
//!
//! `Decoder::decode` is the pipeline entry point:
//! 1. Fetch the root block
//! 2. Verify it as an embedded-key compact token
//! 3. Resolve the `s`, `d`, `t` claims (concurrently)
//!
//! Steps run strictly in this order; claim identifiers are unknown until the
//! root token has been verified.

use std::sync::Arc;

use tracing::{debug, info};

use crate::claims::ClaimsResolver;
use crate::content_id::ContentId;
use crate::error::{DecodeError, DecodeResult};
use crate::fetch::Fetcher;
use crate::gateway::GatewayStore;
use crate::store::ContentStore;
use crate::types::{DecodedEnvelope, FetchOptions, GatewayConfig, RawToken};
use crate::verify::{EmbeddedJwkVerifier, TokenVerifier};

/// SEP-001 Compact envelope decoder.
#[derive(Clone)]
pub struct Decoder {
    fetcher: Fetcher,
    verifier: Arc<dyn TokenVerifier>,
    claims: ClaimsResolver,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Decoder over `store` with the embedded-key verifier and default
    /// fetch options.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_components(
            Fetcher::new(store),
            Arc::new(EmbeddedJwkVerifier::new()),
        )
    }

    /// Decoder with custom fetch options.
    pub fn with_options(store: Arc<dyn ContentStore>, options: FetchOptions) -> Self {
        Self::with_components(
            Fetcher::with_options(store, options),
            Arc::new(EmbeddedJwkVerifier::new()),
        )
    }

    /// Decoder with a custom verifier (for tests or alternative key
    /// resolution).
    pub fn with_components(fetcher: Fetcher, verifier: Arc<dyn TokenVerifier>) -> Self {
        let claims = ClaimsResolver::new(fetcher.clone());
        Self {
            fetcher,
            verifier,
            claims,
        }
    }

    /// Decoder over an HTTP gateway configured from the environment
    /// (`SEP_GATEWAY_*`, `SEP_MAX_BLOCK_SIZE`, `SEP_VERIFY_RAW_BLOCKS`).
    pub fn from_env() -> DecodeResult<Self> {
        Self::from_gateway(GatewayConfig::from_env(), FetchOptions::from_env())
    }

    /// Decoder over an HTTP gateway. The gateway stops reading bodies at
    /// `options.max_block_size`.
    pub fn from_gateway(config: GatewayConfig, options: FetchOptions) -> DecodeResult<Self> {
        let store = GatewayStore::new(config)?.with_max_block_size(options.max_block_size);
        Ok(Self::with_options(Arc::new(store), options))
    }

    /// Decode the envelope rooted at `root`.
    ///
    /// Returns a fully populated envelope or a single error; never a partial
    /// result.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
    pub async fn decode(&self, root: &ContentId) -> DecodeResult<DecodedEnvelope> {
        let token: RawToken = self.fetcher.fetch(root).await?;
        let verified = self.verifier.verify(&token)?;

        debug!(alg = verified.header.alg().unwrap_or_default(), "root token verified");

        let payload = self.claims.resolve(&verified.payload).await?;

        info!("envelope decoded");
        Ok(DecodedEnvelope {
            header: verified.header,
            payload,
        })
    }

    /// Parse `root` and decode it.
    ///
    /// A malformed root is reported as `InvalidRootId`, distinct from
    /// malformed claim identifiers.
    pub async fn decode_str(&self, root: &str) -> DecodeResult<DecodedEnvelope> {
        let cid = ContentId::parse(root).map_err(|e| DecodeError::InvalidRootId {
            value: e.input,
            reason: e.reason,
        })?;
        self.decode(&cid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::{sign_json, signing_key};
    use crate::types::{Header, RawPayload, VerifiedToken};
    use serde_json::json;

    /// Accepts any token whose bytes are a JSON payload, skipping crypto.
    struct PassthroughVerifier;

    impl TokenVerifier for PassthroughVerifier {
        fn verify(&self, token: &[u8]) -> DecodeResult<VerifiedToken> {
            let payload: RawPayload =
                serde_json::from_slice(token).map_err(|e| DecodeError::payload(e.to_string()))?;
            Ok(VerifiedToken {
                header: Header::default(),
                payload,
            })
        }
    }

    #[tokio::test]
    async fn test_decode_round_trip() {
        let store = MemoryStore::new();
        let s = store.put(&br#"{"title":"A"}"#[..]).await;
        let d = store.put(&br#"{"desc":"B"}"#[..]).await;
        let t = store.put(&br#"{"type":"C"}"#[..]).await;

        let key = signing_key();
        let token = sign_json(
            &key,
            &json!({"s": s.to_string(), "d": d.to_string(), "t": t.to_string()}),
        );
        let root = store.put(token).await;

        let decoder = Decoder::new(Arc::new(store));
        let envelope = decoder.decode(&root).await.unwrap();

        assert_eq!(envelope.header.alg(), Some("EdDSA"));
        assert_eq!(envelope.payload.s, json!({"title": "A"}));
        assert_eq!(envelope.payload.d, json!({"desc": "B"}));
        assert_eq!(envelope.payload.t, json!({"type": "C"}));
    }

    #[tokio::test]
    async fn test_decode_str_invalid_root() {
        let decoder = Decoder::new(Arc::new(MemoryStore::new()));
        let err = decoder.decode_str("Qroot").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRootId { ref value, .. } if value == "Qroot"));
    }

    #[tokio::test]
    async fn test_custom_verifier_is_used() {
        let store = MemoryStore::new();
        let doc = store.put(&br#"{"k":1}"#[..]).await;
        let unsigned = json!({"s": doc.to_string(), "d": doc.to_string(), "t": doc.to_string()});
        let root = store.put(serde_json::to_vec(&unsigned).unwrap()).await;

        let store: Arc<dyn ContentStore> = Arc::new(store);
        let default = Decoder::new(store.clone());
        assert!(matches!(
            default.decode(&root).await,
            Err(DecodeError::SignatureVerification { .. })
        ));

        let custom = Decoder::with_components(Fetcher::new(store), Arc::new(PassthroughVerifier));
        let envelope = custom.decode(&root).await.unwrap();
        assert_eq!(envelope.payload.s, json!({"k": 1}));
        assert_eq!(envelope.header, Header::default());
    }

    #[tokio::test]
    async fn test_root_not_found() {
        let decoder = Decoder::new(Arc::new(MemoryStore::new()));
        let root = ContentId::for_raw_block(b"missing root");
        assert!(matches!(
            decoder.decode(&root).await,
            Err(DecodeError::NotFound { .. })
        ));
    }
}
