//! Store constants for RELOG.
//!
//! All durations are expressed in seconds as `f64`, matching the
//! fractional Unix-second [`Timestamp`](crate::types::Timestamp) representation.

// ═══════════════════════════════════════════════════════════════════════════════
// TTL BOUNDS
// ═══════════════════════════════════════════════════════════════════════════════

/// TTL applied when a caller omits one (or supplies a non-positive value).
pub const DEFAULT_TTL_SECONDS: f64 = 600.0;

/// Smallest TTL the store will assign.
///
/// Timestamps near the current epoch have a resolution of roughly 0.2µs in
/// `f64`; anything shorter than this could round `created_at + ttl` back
/// down to `created_at`.
pub const MIN_TTL_SECONDS: f64 = 0.001;

/// Largest TTL the store will assign (~100 years). Keeps expiry finite.
pub const MAX_TTL_SECONDS: f64 = 100.0 * 365.0 * 24.0 * 60.0 * 60.0;

// ═══════════════════════════════════════════════════════════════════════════════
// RECLAMATION & PERSISTENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default interval between scheduled reclaim passes.
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 60;

/// Default number of inserts between automatic saves of a file-backed store.
pub const DEFAULT_AUTO_SAVE_THRESHOLD: u64 = 100;

/// First id handed out by a fresh store.
pub const FIRST_RECORD_ID: u64 = 1;
