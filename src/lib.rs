//! TtlStore - a TTL-aware key/value storage layer
//!
//! Sits atop an opaque asynchronous persistent backend (a browser
//! extension's storage area or any equivalent durable provider) and owns
//! expiration: per-access lazy expiry, a periodic cleanup sweep in
//! long-lived host contexts, add/update/remove change events, ordered
//! non-atomic batches and storage-usage accounting.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod store;

mod tasks;

pub use backend::{MemoryBackend, RawRecord, StorageBackend};
pub use config::StoreConfig;
pub use context::{HostContext, LongLivedContext, SuspendProneContext};
pub use error::{Result, StoreError};
pub use store::{
    BatchOp, BatchResult, EventKind, Listener, PutOptions, StoreEvent, StoredEntry, TtlStore,
};
