//! Domain types for RELOG.
//!
//! - [`Record`]: a user-scoped resource fact with an expiration time
//! - [`StoreStats`]: point-in-time statistics about a store
//! - [`Timestamp`]: fractional Unix seconds

mod record;

pub use record::*;
