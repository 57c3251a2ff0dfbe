//! # RELOG Store
//!
//! TTL-indexed record storage for RELOG.
//!
//! This crate provides:
//!
//! - **Memory**: The indexed in-memory store that owns all query semantics
//! - **File**: A memory store persisted to a single file
//! - **Reaper**: A background task that reclaims expired records on a schedule
//!
//! ## Example
//!
//! ```rust,ignore
//! use relog_store::{MemoryStore, RecordStore};
//!
//! let store = MemoryStore::new();
//!
//! // Insert with a 60 second TTL
//! let record = store.insert("u1", "CPU", Some(60.0)).await?;
//!
//! // Lookups never return expired records, reclaimed or not
//! let live = store.lookup_by_owner("u1", None).await?;
//!
//! // Physically drop whatever has expired
//! let removed = store.reclaim(None).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod file;
mod memory;
mod reaper;

pub use config::StoreConfig;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use reaper::Reaper;

// Re-export the trait from core
pub use relog_core::traits::RecordStore;
