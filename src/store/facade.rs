//! Store Facade Module
//!
//! `TtlStore` composes the backend port, entry codec, expiration policy,
//! listener registry, batch executor and cleanup scheduler behind one
//! public surface.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::config::StoreConfig;
use crate::context::{HostContext, LongLivedContext};
use crate::error::{Result, StoreError};
use crate::store::batch::{BatchOp, BatchResult};
use crate::store::entry::{current_timestamp_ms, PutOptions, StoredEntry};
use crate::store::events::{EventKind, Listener, ListenerRegistry, StoreEvent};
use crate::store::policy;
use crate::store::MAX_KEY_LENGTH;
use crate::tasks::CleanupTask;

// == Shared State ==
/// State shared between the facade and the cleanup scheduler task.
pub(crate) struct Shared {
    pub(crate) backend: Arc<dyn StorageBackend>,
    pub(crate) context: Arc<dyn HostContext>,
    pub(crate) listeners: ListenerRegistry,
    /// Keys with a removal currently in flight. Dedupes remove events when
    /// the lazy and sweep expiry paths race on the same key.
    expiring: Mutex<HashSet<String>>,
}

impl Shared {
    fn ensure_context(&self) -> Result<()> {
        if self.context.is_valid() {
            Ok(())
        } else {
            Err(StoreError::ContextInvalid)
        }
    }

    /// Fetches and decodes the record for a key, expired or not.
    async fn load_entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        match self.backend.get(key).await? {
            Some(record) => Ok(Some(StoredEntry::decode(&record)?)),
            None => Ok(None),
        }
    }

    /// Removes a key and fires `Removed` exactly once per present→absent
    /// transition. Returns whether the key was present.
    ///
    /// All removal paths (explicit remove, lazy expiry, sweep) funnel
    /// through here: a concurrent claim on the same key and a
    /// present-before-removal re-check keep the event count at one even
    /// when those paths race.
    pub(crate) async fn remove_entry(&self, key: &str) -> Result<bool> {
        {
            let mut claimed = self.expiring.lock().unwrap();
            if !claimed.insert(key.to_string()) {
                return Ok(false);
            }
        }

        let result = self.remove_entry_claimed(key).await;
        self.expiring.lock().unwrap().remove(key);
        result
    }

    async fn remove_entry_claimed(&self, key: &str) -> Result<bool> {
        // An externally removed key is a no-op, not an error
        if self.backend.get(key).await?.is_none() {
            return Ok(false);
        }

        self.backend.remove(key).await?;
        self.listeners.emit(&StoreEvent::Removed {
            key: key.to_string(),
        });
        Ok(true)
    }

    /// One sweep pass: list every key, drop the dead ones. Returns the
    /// number of entries removed.
    pub(crate) async fn sweep_expired(&self) -> Result<usize> {
        let now = current_timestamp_ms();
        let mut removed = 0;

        for key in self.backend.list_keys().await? {
            // A key deleted mid-sweep simply no longer shows up
            let Some(entry) = self.load_entry(&key).await? else {
                continue;
            };
            if policy::is_sweep_candidate(&entry, now) && self.remove_entry(&key).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

// == TTL Store ==
/// TTL-aware key/value store over an opaque async backend.
///
/// Construction is explicit: the host owns the instance and tears it down
/// with [`destroy`](TtlStore::destroy).
pub struct TtlStore {
    shared: Arc<Shared>,
    config: StoreConfig,
    cleanup: Mutex<Option<CleanupTask>>,
}

impl TtlStore {
    // == Constructors ==
    /// Creates a store over a backend in a long-lived host context.
    pub fn new(backend: Arc<dyn StorageBackend>, config: StoreConfig) -> Self {
        Self::with_context(backend, Arc::new(LongLivedContext), config)
    }

    /// Creates a store with an explicit host context.
    pub fn with_context(
        backend: Arc<dyn StorageBackend>,
        context: Arc<dyn HostContext>,
        config: StoreConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                context,
                listeners: ListenerRegistry::new(),
                expiring: Mutex::new(HashSet::new()),
            }),
            config,
            cleanup: Mutex::new(None),
        }
    }

    // == Cleanup Scheduler ==
    /// Starts the periodic cleanup sweep (Stopped → Running). Idempotent.
    ///
    /// In a suspend-prone context the scheduler never starts: timers are
    /// unreliable there, and lazy expiration at access time covers
    /// correctness on its own.
    pub fn init_cleanup(&self) {
        if !self.should_run_cleanup() {
            debug!("Suspend-prone context, relying on lazy expiration only");
            return;
        }

        let mut guard = self.cleanup.lock().unwrap();
        if guard.is_none() {
            *guard = Some(CleanupTask::spawn(
                Arc::clone(&self.shared),
                self.config.sweep_interval(),
            ));
        }
    }

    fn should_run_cleanup(&self) -> bool {
        !self.shared.context.is_suspend_prone()
    }

    /// Halts the scheduler and detaches all listeners (Running → Stopped).
    ///
    /// Idempotent and unconditional. An in-flight backend call is not
    /// aborted; only future sweep ticks are disabled.
    pub fn destroy(&self) {
        if let Some(task) = self.cleanup.lock().unwrap().take() {
            task.stop();
        }
        self.shared.listeners.clear();
    }

    // == Write Path ==
    /// Stores a value under a key with optional expiry.
    ///
    /// Add-vs-update is decided by a single prior-existence check (per-key
    /// writes are serialized by the backend) and the matching event fires
    /// with the old/new values.
    pub async fn put(&self, key: &str, value: Value, options: PutOptions) -> Result<()> {
        self.shared.ensure_context()?;
        validate_key(key)?;

        let now = current_timestamp_ms();
        let entry = StoredEntry::new(value.clone(), options.resolve(now));

        let previous = self
            .shared
            .load_entry(key)
            .await?
            .filter(|e| policy::is_live(e, now));

        self.shared.backend.set(key, entry.encode()?).await?;

        match previous {
            Some(old) => self.shared.listeners.emit(&StoreEvent::Updated {
                key: key.to_string(),
                old_value: old.value,
                new_value: value,
            }),
            None => self.shared.listeners.emit(&StoreEvent::Added {
                key: key.to_string(),
                value,
            }),
        }

        Ok(())
    }

    /// Removes a key. Fires exactly one `Removed` event when the record
    /// was present; removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.shared.ensure_context()?;
        self.shared.remove_entry(key).await?;
        Ok(())
    }

    // == Read Path ==
    /// Retrieves the live value for a key.
    ///
    /// An expired record is treated as absent and deleted on the spot, so
    /// expiration is observable before any sweep runs.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.shared.ensure_context()?;

        match self.shared.load_entry(key).await? {
            Some(entry) if policy::is_live(&entry, current_timestamp_ms()) => {
                Ok(Some(entry.value))
            }
            Some(_) => {
                debug!(key, "Lazily expiring record on access");
                self.shared.remove_entry(key).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Retrieves the decoded record for a live key, deadline included.
    /// Same lazy-expiry visibility as [`get`](TtlStore::get), but without
    /// side effects.
    pub async fn get_with_metadata(&self, key: &str) -> Result<Option<StoredEntry>> {
        self.shared.ensure_context()?;

        Ok(self
            .shared
            .load_entry(key)
            .await?
            .filter(|e| policy::is_live(e, current_timestamp_ms())))
    }

    /// Pure live-check with no listener side effects.
    pub async fn has(&self, key: &str) -> Result<bool> {
        self.shared.ensure_context()?;

        Ok(self
            .shared
            .load_entry(key)
            .await?
            .map(|e| policy::is_live(&e, current_timestamp_ms()))
            .unwrap_or(false))
    }

    // == Namespace Scans ==
    // Full-namespace scans filtered client-side: O(n) over stored keys,
    // acceptable at extension-storage scale.

    /// Number of live entries.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.live_keys().await?.len())
    }

    /// True when no live entry exists.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Lists live keys, optionally restricted to a prefix.
    pub async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let keys = self.live_keys().await?;
        Ok(match prefix {
            Some(prefix) => keys.into_iter().filter(|k| k.starts_with(prefix)).collect(),
            None => keys,
        })
    }

    /// First live key starting with `prefix`, if any. Scan order is
    /// unspecified.
    pub async fn get_key_by_prefix(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .live_keys()
            .await?
            .into_iter()
            .find(|k| k.starts_with(prefix)))
    }

    /// First live key ending with `suffix`, if any. Scan order is
    /// unspecified.
    pub async fn get_key_by_suffix(&self, suffix: &str) -> Result<Option<String>> {
        Ok(self
            .live_keys()
            .await?
            .into_iter()
            .find(|k| k.ends_with(suffix)))
    }

    /// Sum of the serialized byte length of every currently-live record.
    /// Reflects only entries this layer still honors, not raw backend
    /// usage.
    pub async fn storage_usage(&self) -> Result<u64> {
        self.shared.ensure_context()?;

        let now = current_timestamp_ms();
        let mut total = 0;

        for key in self.shared.backend.list_keys().await? {
            let Some(record) = self.shared.backend.get(&key).await? else {
                continue;
            };
            if policy::is_live(&StoredEntry::decode(&record)?, now) {
                total += self.shared.backend.bytes_of(&record);
            }
        }

        Ok(total)
    }

    async fn live_keys(&self) -> Result<Vec<String>> {
        self.shared.ensure_context()?;

        let now = current_timestamp_ms();
        let mut live = Vec::new();

        for key in self.shared.backend.list_keys().await? {
            if let Some(entry) = self.shared.load_entry(&key).await? {
                if policy::is_live(&entry, now) {
                    live.push(key);
                }
            }
        }

        Ok(live)
    }

    // == Batch Executor ==
    /// Executes ops strictly in order, one result slot per op. Each op's
    /// effect is immediately visible to the next (read-your-writes).
    ///
    /// There is no cross-op atomicity: on the first failing op the
    /// already-applied mutations stand (no rollback), that op's error is
    /// returned, and later ops are not attempted.
    pub async fn batch(&self, ops: Vec<BatchOp>) -> Result<Vec<BatchResult>> {
        self.shared.ensure_context()?;

        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                BatchOp::Set {
                    key,
                    value,
                    ttl,
                    expires,
                } => {
                    self.put(&key, value, PutOptions { ttl, expires }).await?;
                    results.push(BatchResult::Done);
                }
                BatchOp::Get { key } => {
                    results.push(BatchResult::Value(self.get(&key).await?));
                }
                BatchOp::Remove { key } => {
                    self.remove(&key).await?;
                    results.push(BatchResult::Done);
                }
            }
        }

        Ok(results)
    }

    // == Listeners ==
    /// Registers a callback for an event kind. Re-adding the same callback
    /// is a no-op.
    pub fn add_listener(&self, kind: EventKind, listener: Listener) {
        self.shared.listeners.add(kind, listener);
    }

    /// Removes a callback by identity. An absent callback is a no-op.
    pub fn remove_listener(&self, kind: EventKind, listener: &Listener) {
        self.shared.listeners.remove(kind, listener);
    }
}

impl Drop for TtlStore {
    fn drop(&mut self) {
        self.destroy();
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidRequest(
            "Key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
