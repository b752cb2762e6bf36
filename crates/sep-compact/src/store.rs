//! Content-addressed storage capability.
//!
//! The decoder depends on storage only through [`ContentStore`]. Two
//! implementations ship with the crate:
//! - [`MemoryStore`] - in-process map, for tests and embedders
//! - [`crate::GatewayStore`] - HTTP gateway client

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::content_id::ContentId;
use crate::error::{DecodeError, DecodeResult};

/// Resolves content identifiers to bytes.
///
/// Implementations report unresolvable identifiers as
/// [`DecodeError::NotFound`] and transport failures as
/// [`DecodeError::Storage`]. They must be safe for concurrent use.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the block addressed by `cid`.
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "store"
    }
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        (**self).get(cid).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// In-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<RwLock<HashMap<ContentId, Bytes>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` as a raw block and return its identifier.
    pub async fn put(&self, data: impl Into<Bytes>) -> ContentId {
        let data = data.into();
        let cid = ContentId::for_raw_block(&data);
        self.blocks.write().await.insert(cid, data);
        cid
    }

    /// Store `data` under an arbitrary identifier.
    ///
    /// No digest check is made, so this can also plant mismatching content.
    pub async fn insert(&self, cid: ContentId, data: impl Into<Bytes>) {
        self.blocks.write().await.insert(cid, data.into());
    }

    /// Remove a block. Returns whether it was present.
    pub async fn remove(&self, cid: &ContentId) -> bool {
        self.blocks.write().await.remove(cid).is_some()
    }

    /// Number of stored blocks.
    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        self.blocks
            .read()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| DecodeError::NotFound {
                cid: cid.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
