//! Remote key/value store abstraction.
//!
//! The reconciliation pipeline only needs three operations from the remote
//! tree: a prefix-scoped listing, a single-key put and a single-key delete.
//! No multi-key transaction is assumed.

mod consul;
mod memory;

pub use consul::{ConsulStore, StoreConfig};
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Local key/value data, keyed by path relative to the working prefix
pub type KvMap = HashMap<String, Vec<u8>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to list keys under \"{prefix}\": {message}")]
    Query { prefix: String, message: String },

    #[error("Failed to write key \"{key}\": {message}")]
    Write { key: String, message: String },
}

/// A key/value pair as returned by the store, keyed by absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Vec<u8>,
}

impl KvPair {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Operations the reconciliation pipeline issues against the remote tree.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// List every pair whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>, StoreError>;

    /// Create or overwrite a single key.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove a single key.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
