//! Store configuration.

use serde::{Deserialize, Serialize};

use relog_core::constants::{DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, MIN_TTL_SECONDS};
use relog_core::error::{RelogError, Result};

/// Configuration for a [`MemoryStore`](crate::MemoryStore).
///
/// # Example
///
/// ```rust
/// use relog_store::StoreConfig;
///
/// let config = StoreConfig::default().with_default_ttl(30.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// TTL applied when an insert omits one, in seconds
    pub default_ttl_secs: f64,
    /// Upper bound applied to caller-supplied TTLs, in seconds
    pub max_ttl_secs: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECONDS,
            max_ttl_secs: MAX_TTL_SECONDS,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, secs: f64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    /// Sets the TTL cap.
    pub fn with_max_ttl(mut self, secs: f64) -> Self {
        self.max_ttl_secs = secs;
        self
    }

    /// Checks that the configured TTLs are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.default_ttl_secs.is_finite() || self.default_ttl_secs < MIN_TTL_SECONDS {
            return Err(RelogError::ConfigError(format!(
                "default TTL must be finite and at least {}s, got {}",
                MIN_TTL_SECONDS, self.default_ttl_secs
            )));
        }
        if !self.max_ttl_secs.is_finite() || self.max_ttl_secs < self.default_ttl_secs {
            return Err(RelogError::ConfigError(format!(
                "max TTL {} must be finite and not below the default TTL {}",
                self.max_ttl_secs, self.default_ttl_secs
            )));
        }
        Ok(())
    }

    /// Resolves the TTL an insert will actually use.
    ///
    /// Missing, non-positive and non-finite values fall back to the default;
    /// everything else is clamped into `[MIN_TTL_SECONDS, max_ttl_secs]`.
    /// A clamped TTL is what the record stores, so `expires_at - created_at`
    /// can differ from the requested value (1e-6 becomes 0.001).
    pub fn effective_ttl(&self, requested: Option<f64>) -> f64 {
        match requested {
            Some(ttl) if ttl.is_finite() && ttl > 0.0 => {
                ttl.clamp(MIN_TTL_SECONDS, self.max_ttl_secs)
            }
            _ => self.default_ttl_secs,
        }
    }
}
