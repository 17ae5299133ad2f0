//! Backend Adapter Module
//!
//! Defines the port to the durable key/value provider beneath the store.
//! The provider is opaque: the store only assumes an async get/set/remove
//! plus key enumeration, all over raw JSON records. Concrete adapters are
//! selected by configuration at construction and passed in as trait objects.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;

use crate::error::Result;

/// The raw record a backend stores: the encoded entry, opaque to the backend.
pub type RawRecord = serde_json::Value;

// == Storage Backend Trait ==
/// Async port over the durable key/value provider.
///
/// Per-key write serialization is the backend's responsibility; the store
/// adds no locking of its own on top of this contract.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Fetches the raw record for a key, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<RawRecord>>;

    /// Writes the raw record for a key, replacing any previous record.
    async fn set(&self, key: &str, record: RawRecord) -> Result<()>;

    /// Deletes a key. Removing an absent key is a no-op, not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Enumerates every key currently stored.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Size of a raw record in bytes. Backends without a native size API
    /// fall back to the serialized JSON length.
    fn bytes_of(&self, record: &RawRecord) -> u64 {
        serde_json::to_vec(record).map(|v| v.len() as u64).unwrap_or(0)
    }
}
