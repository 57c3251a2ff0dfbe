//! # RELOG Core
//!
//! Core types, errors, and traits for the RELOG TTL-indexed record store.
//!
//! This crate provides the foundational building blocks used by all other RELOG crates:
//!
//! - **Types**: The [`Record`] entity and [`StoreStats`]
//! - **Errors**: A single error hierarchy with classification helpers
//! - **Constants**: TTL defaults and bounds
//! - **Traits**: [`RecordStore`] and the injectable [`Clock`]
//!
//! ## Example
//!
//! ```rust
//! use relog_core::{Clock, ManualClock, Record};
//!
//! let clock = ManualClock::new(100.0);
//! let record = Record::new(1, "u1", "CPU", clock.now(), 60.0);
//!
//! assert!(record.is_live(150.0));
//! assert!(!record.is_live(160.0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use clock::{ManualClock, SystemClock};
pub use constants::*;
pub use error::{RelogError, Result};
pub use traits::*;
pub use types::*;
