//! Block fetching.
//!
//! Every block the decoder reads (root token and the three claims) goes
//! through [`Fetcher::fetch`]:
//! 1. Delegate to the [`ContentStore`]
//! 2. Normalize error kinds to `NotFound` / `Storage`
//! 3. Enforce the block size limit
//! 4. For raw sha2-256 identifiers, check the bytes hash to the identifier

use std::sync::Arc;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::content_id::{ContentId, RAW_CODEC, SHA2_256_CODE};
use crate::error::{DecodeError, DecodeResult};
use crate::store::ContentStore;
use crate::types::FetchOptions;

/// Fetches blocks from a content store.
#[derive(Clone)]
pub struct Fetcher {
    store: Arc<dyn ContentStore>,
    options: FetchOptions,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("store", &self.store.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Fetcher {
    /// Fetcher with default options.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_options(store, FetchOptions::default())
    }

    pub fn with_options(store: Arc<dyn ContentStore>, options: FetchOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch the block addressed by `cid`.
    pub async fn fetch(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        debug!(cid = %cid, store = self.store.name(), "fetching block");

        let data = self
            .store
            .get(cid)
            .await
            .map_err(|e| normalize_store_error(cid, e))?;

        if data.len() > self.options.max_block_size {
            warn!(
                cid = %cid,
                size = data.len(),
                limit = self.options.max_block_size,
                "block exceeds size limit"
            );
            return Err(DecodeError::storage(format!(
                "block {} is {} bytes, limit is {}",
                cid,
                data.len(),
                self.options.max_block_size
            )));
        }

        if self.options.verify_raw_blocks {
            verify_raw_block(cid, &data)?;
        }

        debug!(cid = %cid, size = data.len(), "fetched block");
        Ok(data)
    }
}

/// Stores only report `NotFound` or `Storage`; anything else is a store bug
/// and is surfaced as a storage failure.
fn normalize_store_error(cid: &ContentId, err: DecodeError) -> DecodeError {
    match err {
        DecodeError::NotFound { .. } | DecodeError::Storage { .. } => err,
        other => DecodeError::storage(format!("store failed for {}: {}", cid, other)),
    }
}

/// Check a raw block against its identifier's sha2-256 digest.
///
/// Other codecs carry framing (dag-pb, UnixFS) that gateways strip, so only
/// raw blocks can be checked byte-for-byte.
pub fn verify_raw_block(cid: &ContentId, data: &[u8]) -> DecodeResult<()> {
    if cid.codec() != RAW_CODEC || cid.hash_code() != SHA2_256_CODE {
        return Ok(());
    }

    let computed = Sha256::digest(data);
    if computed.as_slice() != cid.digest() {
        warn!(cid = %cid, "block content does not match identifier");
        return Err(DecodeError::storage(format!(
            "content does not match identifier {}",
            cid
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl ContentStore for BrokenStore {
        async fn get(&self, _cid: &ContentId) -> DecodeResult<Bytes> {
            Err(DecodeError::Config {
                message: "misconfigured".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_passthrough() {
        let store = MemoryStore::new();
        let cid = store.put(&b"{\"type\":\"C\"}"[..]).await;

        let fetcher = Fetcher::new(Arc::new(store));
        let data = fetcher.fetch(&cid).await.unwrap();
        assert_eq!(&data[..], b"{\"type\":\"C\"}");
    }

    #[tokio::test]
    async fn test_fetch_not_found_preserved() {
        let fetcher = Fetcher::new(Arc::new(MemoryStore::new()));
        let cid = ContentId::for_raw_block(b"nothing");

        let err = fetcher.fetch(&cid).await.unwrap_err();
        assert!(matches!(err, DecodeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unexpected_store_error_normalized() {
        let fetcher = Fetcher::new(Arc::new(BrokenStore));
        let cid = ContentId::for_raw_block(b"x");

        let err = fetcher.fetch(&cid).await.unwrap_err();
        match err {
            DecodeError::Storage { message } => assert!(message.contains("misconfigured")),
            other => panic!("expected Storage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_size_limit() {
        let store = MemoryStore::new();
        let cid = store.put(vec![b'a'; 64]).await;

        let options = FetchOptions::default().with_max_block_size(63);
        let fetcher = Fetcher::with_options(Arc::new(store.clone()), options);
        assert!(matches!(
            fetcher.fetch(&cid).await,
            Err(DecodeError::Storage { .. })
        ));

        let options = FetchOptions::default().with_max_block_size(64);
        let fetcher = Fetcher::with_options(Arc::new(store), options);
        assert!(fetcher.fetch(&cid).await.is_ok());
    }

    #[tokio::test]
    async fn test_raw_block_mismatch_rejected() {
        let store = MemoryStore::new();
        let cid = ContentId::for_raw_block(b"original");
        store.insert(cid, &b"tampered"[..]).await;

        let fetcher = Fetcher::new(Arc::new(store.clone()));
        let err = fetcher.fetch(&cid).await.unwrap_err();
        assert!(err.to_string().contains("does not match"));

        let lenient = Fetcher::with_options(
            Arc::new(store),
            FetchOptions::default().with_verify_raw_blocks(false),
        );
        assert_eq!(&lenient.fetch(&cid).await.unwrap()[..], b"tampered");
    }

    #[test]
    fn test_non_raw_codec_not_checked() {
        let v0 = ContentId::parse("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
        assert!(verify_raw_block(&v0, b"anything").is_ok());
    }
}
