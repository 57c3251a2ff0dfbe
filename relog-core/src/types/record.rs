//! Record types for the RELOG store.
//!
//! A record is created once by the store and never mutated. Whether it is
//! live is computed against a caller-supplied `now`, never stored.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RelogError, Result};

/// Fractional Unix seconds.
pub type Timestamp = f64;

/// A resource fact scoped to an owner, valid until `expires_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (assigned by the store)
    pub id: u64,
    /// Identifier the record is scoped to
    pub owner: String,
    /// Free-form resource description
    pub label: String,
    /// When the store admitted the record
    pub created_at: Timestamp,
    /// First instant at which the record is no longer live
    pub expires_at: Timestamp,
}

impl Record {
    /// Creates a record expiring `ttl` seconds after `created_at`.
    pub fn new(
        id: u64,
        owner: impl Into<String>,
        label: impl Into<String>,
        created_at: Timestamp,
        ttl: f64,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            label: label.into(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Returns true while `expires_at` is strictly after `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    /// The TTL the record was created with.
    pub fn ttl(&self) -> f64 {
        self.expires_at - self.created_at
    }

    /// Seconds of life left at `now` (zero once expired).
    pub fn remaining(&self, now: Timestamp) -> f64 {
        (self.expires_at - now).max(0.0)
    }

    /// Checks that an owner/label pair may be stored.
    pub fn check_fields(owner: &str, label: &str) -> Result<()> {
        if owner.is_empty() {
            return Err(RelogError::InvalidArgument("owner must not be empty".into()));
        }
        if label.is_empty() {
            return Err(RelogError::InvalidArgument("label must not be empty".into()));
        }
        Ok(())
    }

    /// Validates a record that did not come from `insert` (e.g. loaded from disk).
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(RelogError::InvalidRecord("id 0 is reserved".into()));
        }
        Self::check_fields(&self.owner, &self.label)
            .map_err(|e| RelogError::InvalidRecord(format!("record {}: {}", self.id, e)))?;

        if !self.created_at.is_finite() || !self.expires_at.is_finite() {
            return Err(RelogError::InvalidRecord(format!(
                "record {}: timestamps must be finite",
                self.id
            )));
        }
        if self.expires_at <= self.created_at {
            return Err(RelogError::InvalidRecord(format!(
                "record {}: expires_at {} is not after created_at {}",
                self.id, self.expires_at, self.created_at
            )));
        }

        Ok(())
    }

    /// `created_at` rendered as RFC 3339 (UTC, microseconds).
    pub fn created_at_rfc3339(&self) -> Option<String> {
        to_rfc3339(self.created_at)
    }

    /// `expires_at` rendered as RFC 3339 (UTC, microseconds).
    pub fn expires_at_rfc3339(&self) -> Option<String> {
        to_rfc3339(self.expires_at)
    }
}

fn to_rfc3339(ts: Timestamp) -> Option<String> {
    if !ts.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_micros((ts * 1_000_000.0).round() as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Statistics about the records in a store, evaluated at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Records physically stored (live and expired-but-unreclaimed)
    pub total_records: u64,
    /// Records live at the evaluation instant
    pub live_records: u64,
    /// Records expired but still awaiting reclaim
    pub expired_records: u64,
    /// Distinct owners with at least one stored record
    pub owners: u64,
    /// Records ever admitted by this store
    pub inserted_total: u64,
    /// Records ever removed by reclaim
    pub reclaimed_total: u64,
    /// Id the next insert will receive
    pub next_id: u64,
    /// Oldest stored creation time
    pub earliest_created_at: Option<Timestamp>,
    /// Latest stored expiration time
    pub latest_expires_at: Option<Timestamp>,
}

impl StoreStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }
}
