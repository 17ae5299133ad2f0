//! Expiration Policy Module
//!
//! Pure decision logic: given the current time and a decoded record, is it
//! still live. The facade and the sweep both defer to this single predicate
//! so lazy and periodic expiration can never disagree.

use crate::store::entry::StoredEntry;

/// An entry is live while it has no deadline or its deadline lies in the
/// future. The boundary counts as dead: once `now` reaches `expires_at`,
/// the entry is expired.
pub fn is_live(entry: &StoredEntry, now_ms: u64) -> bool {
    match entry.expires_at {
        Some(expires) => expires > now_ms,
        None => true,
    }
}

/// A record is a sweep candidate iff it is no longer live. Processing the
/// same candidate twice is harmless; removal is idempotent.
pub fn is_sweep_candidate(entry: &StoredEntry, now_ms: u64) -> bool {
    !is_live(entry, now_ms)
}
