//! File-backed record store with persistence.
//!
//! Keeps every record in a [`MemoryStore`] and writes the whole store to a
//! single file on save. Suitable for single-node deployments where records
//! should survive a restart.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use relog_core::error::{RelogError, Result};
use relog_core::traits::RecordStore;
use relog_core::types::{Record, StoreStats, Timestamp};

use crate::MemoryStore;

/// File format magic bytes
const MAGIC: &[u8; 4] = b"RLOG";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + next_id + count
const HEADER_LEN: usize = 4 + 1 + 8 + 8;

/// File-based record store.
///
/// All query semantics come from the wrapped [`MemoryStore`]; this type adds
/// loading on open, atomic saves, and dirty tracking.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "RLOG"
/// version (1 byte): 1
/// next_id (8 bytes, LE): id counter, so ids survive restarts
/// count (8 bytes, LE): number of records
/// records (variable): JSON array of records
/// ```
///
/// # Persistence
///
/// Inserts mark the store dirty and trigger a save every
/// `auto_save_threshold` writes. A reclaim that removes anything saves
/// immediately so expired records also leave the disk.
#[derive(Debug)]
pub struct FileStore {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryStore,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Auto-save threshold (save after N inserts, 0 disables)
    auto_save_threshold: u64,
    /// Inserts since last save
    writes_since_save: AtomicU64,
    /// Serializes writers of the temp file
    save_lock: Mutex<()>,
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64> {
    bytes
        .get(offset..offset + 8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| RelogError::StoreFileError(format!("truncated header at byte {}", offset)))
}

impl FileStore {
    /// Opens a file store at `path` with a default memory store.
    ///
    /// If the file exists, it will be loaded. Otherwise, an empty store
    /// is created and the file will be created on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, MemoryStore::new()).await
    }

    /// Opens a file store at `path`, loading into `memory`.
    ///
    /// Use this to supply a custom configuration or clock.
    pub async fn open(path: impl AsRef<Path>, memory: MemoryStore) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            memory,
            dirty: AtomicBool::new(false),
            auto_save_threshold: relog_core::constants::DEFAULT_AUTO_SAVE_THRESHOLD,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if fs::try_exists(&store.path).await? {
            store.load().await?;
        }

        Ok(store)
    }

    /// Sets the number of inserts between automatic saves (0 disables).
    pub fn with_auto_save(mut self, threshold: u64) -> Self {
        self.auto_save_threshold = threshold;
        self
    }

    /// Loads records from the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await.map_err(|e| {
            RelogError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open store file: {}", e),
            ))
        })?;

        if contents.len() < HEADER_LEN {
            return Err(RelogError::StoreFileError("File too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(RelogError::StoreFileError("Invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != VERSION {
            return Err(RelogError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let next_id = read_u64(&contents, 5)?;
        let count = read_u64(&contents, 13)?;
        info!(count, next_id, "Loading records from file");

        let records: Vec<Record> = serde_json::from_slice(&contents[HEADER_LEN..])?;
        if records.len() as u64 != count {
            return Err(RelogError::StoreFileError(format!(
                "header declares {} records, payload has {}",
                count,
                records.len()
            )));
        }

        self.memory.import(records)?;
        self.memory.advance_next_id(next_id);

        self.dirty.store(false, Ordering::SeqCst);
        debug!("Store loaded successfully");

        Ok(())
    }

    /// Saves all records to the file.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;

        // Cleared before the snapshot: a write racing with this save re-marks it
        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        let result = self.write_snapshot().await;
        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn write_snapshot(&self) -> Result<()> {
        let next_id = self.memory.next_id();
        let records = self.memory.snapshot();
        let count = records.len() as u64;

        info!(count, "Saving store to file");

        let serialized = serde_json::to_vec(&records)?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&next_id.to_le_bytes());
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        debug!("Store saved successfully");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory store for direct access.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Saves once the auto-save threshold is reached.
    ///
    /// A failed save leaves the store dirty; the record that triggered it is
    /// already stored, so the failure is logged rather than returned.
    async fn maybe_auto_save(&self) {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst) + 1;
        if self.auto_save_threshold > 0 && writes >= self.auto_save_threshold {
            if let Err(e) = self.save().await {
                warn!(path = ?self.path, error = %e, "Auto-save failed");
            }
        }
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort: Drop cannot await a save
        if self.is_dirty() {
            warn!(path = ?self.path, "FileStore dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn insert(&self, owner: &str, label: &str, ttl: Option<f64>) -> Result<Record> {
        let record = self.memory.insert(owner, label, ttl).await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await;
        Ok(record)
    }

    async fn lookup_by_owner(&self, owner: &str, now: Option<Timestamp>) -> Result<Vec<Record>> {
        self.memory.lookup_by_owner(owner, now).await
    }

    async fn lookup_by_creation_time(
        &self,
        created_at: Timestamp,
        now: Option<Timestamp>,
    ) -> Result<Vec<Record>> {
        self.memory.lookup_by_creation_time(created_at, now).await
    }

    async fn live_records(&self, now: Option<Timestamp>) -> Result<Vec<Record>> {
        self.memory.live_records(now).await
    }

    async fn reclaim(&self, now: Option<Timestamp>) -> Result<usize> {
        let removed = self.memory.reclaim(now).await?;
        if removed > 0 {
            self.dirty.store(true, Ordering::SeqCst);
            self.save().await?;
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }

    async fn stats(&self, now: Option<Timestamp>) -> Result<StoreStats> {
        self.memory.stats(now).await
    }

    async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }
}
