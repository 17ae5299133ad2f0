//! In-Memory Backend
//!
//! Reference [`StorageBackend`] adapter over a HashMap. Used by the test
//! suites and available for embeddings that do not need durability.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::backend::{RawRecord, StorageBackend};
use crate::error::Result;

// == Memory Backend ==
/// Thread-safe in-memory key/value provider.
///
/// Cloning produces a new handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<HashMap<String, RawRecord>>>,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw records currently stored, expired or not.
    pub fn raw_len(&self) -> usize {
        self.inner.read().unwrap().len()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<RawRecord>> {
        let map = self.inner.read().unwrap();
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, record: RawRecord) -> Result<()> {
        let mut map = self.inner.write().unwrap();
        map.insert(key.to_string(), record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.inner.write().unwrap();
        map.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let map = self.inner.read().unwrap();
        Ok(map.keys().cloned().collect())
    }
}
