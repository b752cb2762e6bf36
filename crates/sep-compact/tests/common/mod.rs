//! Shared helpers for integration tests: token minting and instrumented stores.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey};
use sep_compact::{ContentId, ContentStore, DecodeResult, MemoryStore};
use serde_json::{json, Value};
use tokio::sync::Barrier;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn signing_key() -> SigningKey {
    SigningKey::generate(&mut rand::thread_rng())
}

pub fn embedded_jwk(key: &SigningKey) -> Value {
    json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "x": BASE64URL.encode(key.verifying_key().as_bytes()),
    })
}

pub fn protected_header(key: &SigningKey) -> Value {
    json!({"alg": "EdDSA", "typ": "JWT", "jwk": embedded_jwk(key)})
}

pub fn sign_with_header(key: &SigningKey, header: &Value, payload: &[u8]) -> String {
    let signing_input = format!(
        "{}.{}",
        BASE64URL.encode(serde_json::to_vec(header).unwrap()),
        BASE64URL.encode(payload)
    );
    let signature = key.sign(signing_input.as_bytes());
    format!("{}.{}", signing_input, BASE64URL.encode(signature.to_bytes()))
}

pub fn sign_json(key: &SigningKey, payload: &Value) -> String {
    sign_with_header(key, &protected_header(key), &serde_json::to_vec(payload).unwrap())
}

/// A stored envelope: root token plus its three claim documents.
pub struct Fixture {
    pub store: MemoryStore,
    pub key: SigningKey,
    pub root: ContentId,
    pub s: ContentId,
    pub d: ContentId,
    pub t: ContentId,
}

/// The `{"title":"A"}` / `{"desc":"B"}` / `{"type":"C"}` envelope.
pub async fn fixture() -> Fixture {
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

    Fixture {
        store,
        key,
        root,
        s,
        d,
        t,
    }
}

/// Counts and records every `get`.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    calls: AtomicUsize,
    seen: Mutex<Vec<ContentId>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ContentId> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for CountingStore {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*cid);
        self.inner.get(cid).await
    }
}

/// Makes the listed identifiers wait on a shared barrier before answering,
/// so they only complete if fetched concurrently.
pub struct BarrierStore {
    pub inner: MemoryStore,
    pub gated: HashSet<ContentId>,
    pub barrier: Arc<Barrier>,
}

#[async_trait]
impl ContentStore for BarrierStore {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        if self.gated.contains(cid) {
            self.barrier.wait().await;
        }
        self.inner.get(cid).await
    }
}

/// Never answers for the listed identifiers.
pub struct HangingStore {
    pub inner: MemoryStore,
    pub hang: HashSet<ContentId>,
}

#[async_trait]
impl ContentStore for HangingStore {
    async fn get(&self, cid: &ContentId) -> DecodeResult<Bytes> {
        if self.hang.contains(cid) {
            std::future::pending::<()>().await;
        }
        self.inner.get(cid).await
    }
}
