//! Host Context Module
//!
//! Describes the execution environment the store runs in. The cleanup
//! scheduler asks two questions of the host: whether the context may be
//! suspended between events (making long-lived timers unreliable), and
//! whether the context is still alive at all.

use std::sync::atomic::{AtomicBool, Ordering};

// == Host Context Trait ==
/// Capabilities of the host execution environment.
pub trait HostContext: Send + Sync + 'static {
    /// True when the host may pause or terminate this context between
    /// events. Periodic timers are unreliable there, so the store relies
    /// solely on lazy expiration at access time.
    fn is_suspend_prone(&self) -> bool;

    /// True while the host still considers this context alive. Once false,
    /// public operations short-circuit before touching the backend.
    fn is_valid(&self) -> bool;
}

// == Long-Lived Context ==
/// A context that stays alive for the process lifetime and is never
/// suspended. The default for ordinary embeddings.
#[derive(Debug, Default)]
pub struct LongLivedContext;

impl HostContext for LongLivedContext {
    fn is_suspend_prone(&self) -> bool {
        false
    }

    fn is_valid(&self) -> bool {
        true
    }
}

// == Suspend-Prone Context ==
/// A service-worker-like context: valid until the host invalidates it, and
/// always suspend-prone. Invalidation is one-way.
#[derive(Debug, Default)]
pub struct SuspendProneContext {
    invalidated: AtomicBool,
}

impl SuspendProneContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the context as unloaded by the host.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

impl HostContext for SuspendProneContext {
    fn is_suspend_prone(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        !self.invalidated.load(Ordering::SeqCst)
    }
}
