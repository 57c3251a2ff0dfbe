//! DTOs for API requests and responses.
//!
//! Field names follow the resource-log wire format: `id` is the
//! owner's identifier and `resource` the label.

use serde::{Deserialize, Serialize};
use relog_core::types::Record;

/// Request to log a resource.
///
/// Every field is optional at the serde level so that a missing `id` or
/// `resource` is answered with a 400 rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddResourceRequest {
    /// Owner identifier
    pub id: Option<String>,
    /// Resource label
    pub resource: Option<String>,
    /// TTL in seconds; anything that is not a number is ignored
    pub ttl: Option<serde_json::Value>,
}

impl AddResourceRequest {
    /// The TTL as a number, if one was supplied in a usable form.
    ///
    /// Numeric strings are accepted; other values yield `None` so the store
    /// applies its default.
    pub fn ttl_secs(&self) -> Option<f64> {
        match self.ttl.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Response for a logged resource.
#[derive(Debug, Serialize)]
pub struct AddResourceResponse {
    /// Confirmation
    pub message: String,
    /// Assigned record ID
    pub record_id: u64,
    /// Creation time; pass it back to the timestamp lookup to find this record
    pub timestamp: f64,
    /// Expiration time
    pub expires_at: f64,
}

/// A live resource record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDto {
    /// Record ID
    pub record_id: u64,
    /// Owner identifier
    pub id: String,
    /// Resource label
    pub resource: String,
    /// Creation time
    pub timestamp: f64,
    /// Expiration time
    pub expires_at: f64,
}

impl From<Record> for ResourceDto {
    fn from(record: Record) -> Self {
        Self {
            record_id: record.id,
            id: record.owner,
            resource: record.label,
            timestamp: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

/// Response for a reclaim pass.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// Number of expired records removed
    pub removed: usize,
}

/// Service banner.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Status line
    pub message: String,
    /// Available endpoints
    pub endpoints: Vec<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Stored records, including expired ones awaiting reclaim
    pub records_count: u64,
}
