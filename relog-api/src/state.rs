//! App state: record store and config.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use relog_core::constants::{
    DEFAULT_AUTO_SAVE_THRESHOLD, DEFAULT_REAP_INTERVAL_SECS, DEFAULT_TTL_SECONDS,
    MAX_TTL_SECONDS, MIN_TTL_SECONDS,
};
use relog_core::error::Result;
use relog_core::traits::RecordStore;
use relog_store::{FileStore, MemoryStore, StoreConfig};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// TTL for inserts that do not carry one
    pub default_ttl_secs: f64,
    /// Store file; `None` keeps records in memory only
    pub store_path: Option<PathBuf>,
    /// Seconds between background reclaim passes (0 disables)
    pub reap_interval_secs: u64,
    /// Inserts between automatic saves of the store file
    pub auto_save_threshold: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECONDS,
            store_path: None,
            reap_interval_secs: DEFAULT_REAP_INTERVAL_SECS,
            auto_save_threshold: DEFAULT_AUTO_SAVE_THRESHOLD,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

/// Makes a configured default TTL acceptable to `StoreConfig::validate`.
fn sanitize_default_ttl(ttl: f64) -> f64 {
    if !ttl.is_finite() || ttl <= 0.0 {
        warn!(ttl, "TTL_SECONDS must be positive, using default");
        return DEFAULT_TTL_SECONDS;
    }
    let clamped = ttl.clamp(MIN_TTL_SECONDS, MAX_TTL_SECONDS);
    if clamped != ttl {
        warn!(ttl, clamped, "TTL_SECONDS out of range, clamping");
    }
    clamped
}

impl ApiConfig {
    /// Loads configuration from the environment (and `.env`, if present).
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            default_ttl_secs: sanitize_default_ttl(env_or("TTL_SECONDS", DEFAULT_TTL_SECONDS)),
            store_path: std::env::var("STORE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            reap_interval_secs: env_or("REAP_INTERVAL_SECS", DEFAULT_REAP_INTERVAL_SECS),
            auto_save_threshold: env_or("AUTO_SAVE_THRESHOLD", DEFAULT_AUTO_SAVE_THRESHOLD),
        }
    }

    /// Store configuration derived from this API configuration.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_default_ttl(self.default_ttl_secs)
    }

    /// Opens the store file at `path` with this configuration's TTL and
    /// auto-save settings.
    pub async fn open_file_store(&self, path: &Path) -> Result<FileStore> {
        let memory = MemoryStore::with_config(self.store_config())?;
        Ok(FileStore::open(path, memory)
            .await?
            .with_auto_save(self.auto_save_threshold))
    }
}

/// Shared application state.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// Record store
    pub store: Arc<dyn RecordStore>,
    started_at: Instant,
}

impl AppState {
    /// Wraps an already constructed store.
    pub fn new(config: ApiConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            store,
            started_at: Instant::now(),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: ApiConfig) -> Result<Self> {
        let store = MemoryStore::with_config(config.store_config())?;
        Ok(Self::new(config, Arc::new(store)))
    }

    /// Builds the store `config` asks for: file-backed when `store_path` is set.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        match config.store_path.clone() {
            Some(path) => {
                let store = config.open_file_store(&path).await?;
                info!(path = ?path, records = store.len(), "Using file store");
                Ok(Self::new(config, Arc::new(store)))
            }
            None => {
                info!("Using in-memory store");
                Self::in_memory(config)
            }
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
