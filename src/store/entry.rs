//! Entry Codec Module
//!
//! Wraps a value with an optional absolute expiration instant into the raw
//! record the backend stores, and unwraps it back.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::RawRecord;
use crate::error::Result;

// == Stored Entry ==
/// The decoded form of a backend record: the caller's value plus an
/// optional absolute expiration instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix milliseconds), None = durable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    /// Creates an entry around a value with an optional expiration instant.
    pub fn new(value: Value, expires_at: Option<u64>) -> Self {
        Self { value, expires_at }
    }

    /// Encodes the entry into the raw record the backend stores.
    pub fn encode(&self) -> Result<RawRecord> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a raw backend record back into an entry.
    pub fn decode(record: &RawRecord) -> Result<Self> {
        Ok(serde_json::from_value(record.clone())?)
    }

    /// Returns remaining TTL in milliseconds, or None for durable entries.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has already expired
    /// - `Some(remaining_ms)` if the entry has a deadline it has not reached
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }
}

// == Put Options ==
/// Expiry options accepted by `put`.
///
/// `ttl` is a relative duration in seconds; `expires` is an explicit
/// absolute instant. When both are supplied the explicit `expires` wins
/// (explicit overrides relative).
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Relative time-to-live in seconds
    pub ttl: Option<u64>,
    /// Explicit absolute expiration instant
    pub expires: Option<DateTime<Utc>>,
}

impl PutOptions {
    /// A durable entry: no TTL, no explicit expiry.
    pub fn durable() -> Self {
        Self::default()
    }

    /// Expire the entry `seconds` after the write.
    pub fn ttl(seconds: u64) -> Self {
        Self {
            ttl: Some(seconds),
            ..Self::default()
        }
    }

    /// Expire the entry at an explicit instant.
    pub fn expires_at(instant: DateTime<Utc>) -> Self {
        Self {
            expires: Some(instant),
            ..Self::default()
        }
    }

    /// Resolves the options to an absolute deadline in Unix milliseconds.
    ///
    /// The explicit `expires` instant takes precedence over a relative
    /// `ttl`; an instant before the epoch clamps to 0 (already expired).
    pub fn resolve(&self, now_ms: u64) -> Option<u64> {
        if let Some(expires) = self.expires {
            return Some(expires.timestamp_millis().max(0) as u64);
        }
        self.ttl.map(|ttl| now_ms + ttl * 1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
