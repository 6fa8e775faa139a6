use super::{KvPair, KvStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// In-process store backed by an ordered map.
///
/// Counts every mutation it receives and can be told to fail listings or
/// writes to specific keys, which makes it the store of choice for exercising
/// dry-run and partial-application behaviour.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_keys: HashSet<String>,
    fail_listing: bool,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given absolute keys
    pub fn with_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: Mutex::new(data),
            ..Self::default()
        }
    }

    /// Make every listing fail with a query error
    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make puts and deletes of `key` fail with a write error
    pub fn fail_writes_to(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Snapshot of the current contents
    pub async fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.data.lock().await.clone()
    }

    /// Number of successful puts issued so far
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of successful deletes issued so far
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_keys.contains(key) {
            return Err(StoreError::Write {
                key: key.to_string(),
                message: "write rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Query {
                prefix: prefix.to_string(),
                message: "listing rejected".to_string(),
            });
        }

        let data = self.data.lock().await;
        Ok(data
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| KvPair::new(key.clone(), value.clone()))
            .collect())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.data.lock().await.insert(key.to_string(), value.to_vec());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.data.lock().await.remove(key);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
