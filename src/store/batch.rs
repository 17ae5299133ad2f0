//! Batch Operations Module
//!
//! Shapes for the ordered, non-atomic batch surface. Ops deserialize from
//! the JSON messages extension pages exchange; results are consumed
//! in-process, one slot per op.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

// == Batch Op ==
/// A single operation inside a batch, executed strictly in array order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BatchOp {
    /// Write a value, optionally expiring
    Set {
        key: String,
        value: Value,
        #[serde(default)]
        ttl: Option<u64>,
        #[serde(default)]
        expires: Option<DateTime<Utc>>,
    },
    /// Read a value
    Get { key: String },
    /// Delete a key
    Remove { key: String },
}

impl BatchOp {
    /// A durable write.
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        BatchOp::Set {
            key: key.into(),
            value,
            ttl: None,
            expires: None,
        }
    }

    /// A write expiring `ttl` seconds after execution.
    pub fn set_with_ttl(key: impl Into<String>, value: Value, ttl: u64) -> Self {
        BatchOp::Set {
            key: key.into(),
            value,
            ttl: Some(ttl),
            expires: None,
        }
    }

    pub fn get(key: impl Into<String>) -> Self {
        BatchOp::Get { key: key.into() }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        BatchOp::Remove { key: key.into() }
    }
}

// == Batch Result ==
/// One result slot per executed op: `Get` yields the value or `None`,
/// mutations yield `Done`.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    Value(Option<Value>),
    Done,
}
