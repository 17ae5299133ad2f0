//! Background Tasks Module
//!
//! Contains the cleanup sweep task that runs periodically in long-lived
//! host contexts.

mod cleanup;

pub(crate) use cleanup::CleanupTask;
