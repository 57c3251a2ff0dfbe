//! Common traits for RELOG.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! enabling modularity and testing.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Record, StoreStats, Timestamp};

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of "now" for a store.
///
/// Injected at construction so TTL behavior can be tested without sleeping.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as fractional Unix seconds.
    fn now(&self) -> Timestamp;
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORD STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for TTL-indexed record storage.
///
/// Every lookup filters out records that are no longer live at `now`,
/// whether or not [`reclaim`](RecordStore::reclaim) has run. Passing `None`
/// for `now` evaluates liveness against the store's own clock at call time.
///
/// Implementations might use:
/// - In-memory storage (for testing and single-process deployments)
/// - A memory store persisted to a file
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores a new record and returns it with its assigned id and timestamps.
    ///
    /// A `ttl` that is missing, non-positive or non-finite is replaced by the
    /// store's default TTL. Fails with `InvalidArgument` when `owner` or
    /// `label` is empty, in which case nothing is stored.
    async fn insert(&self, owner: &str, label: &str, ttl: Option<f64>) -> Result<Record>;

    /// Returns every live record belonging to `owner`, in id order.
    async fn lookup_by_owner(&self, owner: &str, now: Option<Timestamp>) -> Result<Vec<Record>>;

    /// Returns every live record whose `created_at` is exactly `created_at`.
    ///
    /// Exact floating-point equality: the timestamp must be the one the store
    /// assigned, bit for bit.
    async fn lookup_by_creation_time(
        &self,
        created_at: Timestamp,
        now: Option<Timestamp>,
    ) -> Result<Vec<Record>>;

    /// Returns every live record, in id order.
    async fn live_records(&self, now: Option<Timestamp>) -> Result<Vec<Record>>;

    /// Physically removes every record with `expires_at <= now`.
    ///
    /// Returns the number of records removed.
    async fn reclaim(&self, now: Option<Timestamp>) -> Result<usize>;

    /// Returns the number of stored records, including expired ones not yet reclaimed.
    async fn count(&self) -> Result<u64>;

    /// Returns store statistics evaluated at `now`.
    async fn stats(&self, now: Option<Timestamp>) -> Result<StoreStats>;

    /// Persists pending changes, if the backend has any.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
