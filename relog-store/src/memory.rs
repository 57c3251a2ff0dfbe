//! In-memory record store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments. Also the engine behind [`FileStore`](crate::FileStore).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use relog_core::clock::SystemClock;
use relog_core::constants::FIRST_RECORD_ID;
use relog_core::error::{RelogError, Result};
use relog_core::traits::{Clock, RecordStore};
use relog_core::types::{Record, StoreStats, Timestamp};

use crate::config::StoreConfig;

/// Totally ordered timestamp used as an index key.
///
/// `-0.0` is folded into `0.0` so both spellings of zero land in one bucket.
#[derive(Clone, Copy, Debug)]
struct TimeKey(f64);

impl TimeKey {
    fn new(ts: Timestamp) -> Self {
        Self(if ts == 0.0 { 0.0 } else { ts })
    }
}

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn push_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

fn remove_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Ok(pos) = ids.binary_search(&id) {
        ids.remove(pos);
    }
}

/// Everything guarded by the store lock.
///
/// Index buckets hold ids in ascending order and are dropped once empty.
#[derive(Debug)]
struct StoreState {
    /// Primary storage: ID → Record
    records: BTreeMap<u64, Record>,
    /// Owner index: owner → [record IDs]
    by_owner: HashMap<String, Vec<u64>>,
    /// Creation index: created_at → [record IDs]
    by_created: BTreeMap<TimeKey, Vec<u64>>,
    /// Expiry index: expires_at → [record IDs], walked in order by reclaim
    by_expiry: BTreeMap<TimeKey, Vec<u64>>,
    next_id: u64,
    inserted_total: u64,
    reclaimed_total: u64,
}

impl StoreState {
    fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            by_owner: HashMap::new(),
            by_created: BTreeMap::new(),
            by_expiry: BTreeMap::new(),
            next_id: FIRST_RECORD_ID,
            inserted_total: 0,
            reclaimed_total: 0,
        }
    }

    fn link(&mut self, record: Record) {
        let id = record.id;

        push_sorted(self.by_owner.entry(record.owner.clone()).or_default(), id);
        push_sorted(
            self.by_created.entry(TimeKey::new(record.created_at)).or_default(),
            id,
        );
        push_sorted(
            self.by_expiry.entry(TimeKey::new(record.expires_at)).or_default(),
            id,
        );

        self.records.insert(id, record);
    }

    /// Removes a record from the primary map and the owner/creation indexes.
    ///
    /// The expiry index is left to the caller, which is already walking it.
    fn unlink(&mut self, id: u64) -> Option<Record> {
        let record = self.records.remove(&id)?;

        if let Some(ids) = self.by_owner.get_mut(&record.owner) {
            remove_sorted(ids, id);
            if ids.is_empty() {
                self.by_owner.remove(&record.owner);
            }
        }

        let created = TimeKey::new(record.created_at);
        if let Some(ids) = self.by_created.get_mut(&created) {
            remove_sorted(ids, id);
            if ids.is_empty() {
                self.by_created.remove(&created);
            }
        }

        Some(record)
    }

    fn live_from(&self, ids: &[u64], now: Timestamp) -> Vec<Record> {
        ids.iter()
            .filter_map(|id| self.records.get(id))
            .filter(|record| record.is_live(now))
            .cloned()
            .collect()
    }
}

/// In-memory TTL-indexed record store.
///
/// # Indexing
///
/// Records are indexed by:
/// - ID: Primary storage, iterated in id order
/// - Owner: For `lookup_by_owner`
/// - Creation time: For exact `lookup_by_creation_time`
/// - Expiration time: So `reclaim` only visits expired records
///
/// # Expiration
///
/// Lookups filter on `expires_at > now` every time they run, so an expired
/// record is never returned even if `reclaim` has not been called. `reclaim`
/// exists to free memory, not for correctness.
///
/// # Thread Safety
///
/// A single `RwLock` guards the records and all indexes. Inserts and
/// reclaims take it exclusively; lookups share it and always see a fully
/// indexed snapshot.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store with the default configuration and the system clock.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::new()),
            config: StoreConfig::default(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Creates a store with a custom configuration and the system clock.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a store reading "now" from `clock`.
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(StoreState::new()),
            config,
            clock,
        })
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current time according to the store clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn resolve_now(&self, now: Option<Timestamp>) -> Timestamp {
        now.unwrap_or_else(|| self.clock.now())
    }

    /// Returns the number of stored records (including expired ones).
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Returns the id the next insert will receive.
    pub fn next_id(&self) -> u64 {
        self.state.read().next_id
    }

    /// Raises the id counter to at least `next_id`. Never lowers it.
    pub fn advance_next_id(&self, next_id: u64) {
        let mut state = self.state.write();
        state.next_id = state.next_id.max(next_id);
    }

    /// Drops every record. The id counter keeps counting.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.records.clear();
        state.by_owner.clear();
        state.by_created.clear();
        state.by_expiry.clear();
    }

    /// Returns all stored records, expired or not, in id order (for export/backup).
    pub fn snapshot(&self) -> Vec<Record> {
        self.state.read().records.values().cloned().collect()
    }

    /// Restores records from a list, keeping their ids.
    ///
    /// Records with id 0 get a fresh id. The whole batch is validated before
    /// anything is stored, so a rejected import leaves the store untouched.
    pub fn import(&self, records: Vec<Record>) -> Result<usize> {
        let mut state = self.state.write();

        let mut batch = Vec::with_capacity(records.len());
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        let mut next_id = state.next_id;

        for mut record in records {
            if record.id == 0 {
                record.id = next_id;
            }
            record.validate()?;

            if state.records.contains_key(&record.id) || !seen.insert(record.id) {
                return Err(RelogError::DuplicateRecord(record.id));
            }
            let after = record.id.checked_add(1).ok_or_else(|| {
                RelogError::InvalidRecord(format!(
                    "record id {} leaves no ids for new records",
                    record.id
                ))
            })?;
            next_id = next_id.max(after);
            batch.push(record);
        }

        let imported = batch.len();
        for record in batch {
            state.link(record);
        }
        state.next_id = next_id;

        debug!(imported, next_id, "Imported records");
        Ok(imported)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    /// Stores a new record.
    ///
    /// The clock is read under the write lock, so ids and creation times
    /// advance together.
    #[instrument(skip(self, label))]
    async fn insert(&self, owner: &str, label: &str, ttl: Option<f64>) -> Result<Record> {
        Record::check_fields(owner, label)?;
        let ttl = self.config.effective_ttl(ttl);

        let mut state = self.state.write();

        let created_at = self.clock.now();
        if !created_at.is_finite() {
            return Err(RelogError::InternalError(format!(
                "clock returned non-finite time {}",
                created_at
            )));
        }

        let id = state.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| RelogError::InternalError("record ids exhausted".into()))?;
        let record = Record::new(id, owner, label, created_at, ttl);
        if record.expires_at <= record.created_at {
            return Err(RelogError::InternalError(format!(
                "ttl {}s vanished at created_at {}",
                ttl, created_at
            )));
        }

        state.next_id = next_id;
        state.inserted_total += 1;
        state.link(record.clone());

        debug!(id, created_at, expires_at = record.expires_at, "Inserted record");
        Ok(record)
    }

    /// Retrieves live records for an owner.
    ///
    /// O(1) bucket lookup, then O(k) over that owner's stored records.
    #[instrument(skip(self))]
    async fn lookup_by_owner(&self, owner: &str, now: Option<Timestamp>) -> Result<Vec<Record>> {
        let now = self.resolve_now(now);
        let state = self.state.read();

        let records = match state.by_owner.get(owner) {
            Some(ids) => state.live_from(ids, now),
            None => Vec::new(),
        };

        debug!(count = records.len(), "Retrieved by owner");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn lookup_by_creation_time(
        &self,
        created_at: Timestamp,
        now: Option<Timestamp>,
    ) -> Result<Vec<Record>> {
        let now = self.resolve_now(now);
        let state = self.state.read();

        let records = match state.by_created.get(&TimeKey::new(created_at)) {
            Some(ids) => state.live_from(ids, now),
            None => Vec::new(),
        };

        debug!(count = records.len(), "Retrieved by creation time");
        Ok(records)
    }

    async fn live_records(&self, now: Option<Timestamp>) -> Result<Vec<Record>> {
        let now = self.resolve_now(now);
        let state = self.state.read();

        Ok(state
            .records
            .values()
            .filter(|record| record.is_live(now))
            .cloned()
            .collect())
    }

    /// Removes every record with `expires_at <= now`.
    ///
    /// Walks the expiry index from the front, so the cost is proportional to
    /// the number of expired records, not the store size.
    #[instrument(skip(self))]
    async fn reclaim(&self, now: Option<Timestamp>) -> Result<usize> {
        let now = self.resolve_now(now);
        if now.is_nan() {
            warn!("Reclaim called with NaN timestamp, nothing removed");
            return Ok(0);
        }

        let mut state = self.state.write();

        let expired: Vec<TimeKey> = state
            .by_expiry
            .range(..=TimeKey::new(now))
            .map(|(key, _)| *key)
            .collect();

        let mut removed = 0usize;
        for key in expired {
            if let Some(ids) = state.by_expiry.remove(&key) {
                for id in ids {
                    if state.unlink(id).is_some() {
                        removed += 1;
                    }
                }
            }
        }
        state.reclaimed_total += removed as u64;

        if removed > 0 {
            debug!(removed, remaining = state.records.len(), "Reclaimed expired records");
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.state.read().records.len() as u64)
    }

    async fn stats(&self, now: Option<Timestamp>) -> Result<StoreStats> {
        let now = self.resolve_now(now);
        let state = self.state.read();

        let total = state.records.len() as u64;
        let live = state.records.values().filter(|r| r.is_live(now)).count() as u64;

        Ok(StoreStats {
            total_records: total,
            live_records: live,
            expired_records: total - live,
            owners: state.by_owner.len() as u64,
            inserted_total: state.inserted_total,
            reclaimed_total: state.reclaimed_total,
            next_id: state.next_id,
            earliest_created_at: state.by_created.keys().next().map(|k| k.0),
            latest_expires_at: state.by_expiry.keys().next_back().map(|k| k.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use relog_core::clock::ManualClock;
    use test_case::test_case;

    fn store_at(now: f64) -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let store = MemoryStore::with_clock(StoreConfig::default(), clock.clone()).unwrap();
        (store, clock)
    }

    #[tokio::test]
    async fn test_expiry_scenario() {
        let (store, _clock) = store_at(0.0);

        store.insert("u1", "CPU", Some(1.0)).await.unwrap();

        let live = store.lookup_by_owner("u1", Some(0.5)).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].label, "CPU");

        let expired = store.lookup_by_owner("u1", Some(1.5)).await.unwrap();
        assert!(expired.is_empty());

        assert_eq!(store.reclaim(Some(1.5)).await.unwrap(), 1);
        assert_eq!(store.reclaim(Some(2.0)).await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_timestamps() {
        let (store, _clock) = store_at(1_000.0);

        let record = store.insert("u1", "RAM", Some(30.0)).await.unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.created_at, 1_000.0);
        assert_eq!(record.expires_at, 1_030.0);
    }

    #[tokio::test]
    async fn test_default_ttl_applied() {
        let clock = Arc::new(ManualClock::new(50.0));
        let config = StoreConfig::default().with_default_ttl(42.0);
        let store = MemoryStore::with_clock(config, clock).unwrap();

        let record = store.insert("u1", "Disk", None).await.unwrap();
        assert_eq!(record.expires_at - record.created_at, 42.0);
    }

    #[test_case(Some(0.0) ; "zero")]
    #[test_case(Some(-10.0) ; "negative")]
    #[test_case(Some(f64::NAN) ; "nan")]
    #[test_case(Some(f64::INFINITY) ; "infinite")]
    #[tokio::test]
    async fn test_non_positive_ttl_coerced_to_default(ttl: Option<f64>) {
        let (store, _clock) = store_at(0.0);

        let record = store.insert("u1", "CPU", ttl).await.unwrap();
        assert_eq!(record.ttl(), store.config().default_ttl_secs);
    }

    #[test_case("", "x" ; "empty owner")]
    #[test_case("u", "" ; "empty label")]
    #[tokio::test]
    async fn test_invalid_insert_stores_nothing(owner: &str, label: &str) {
        let (store, _clock) = store_at(0.0);
        store.insert("u0", "seed", None).await.unwrap();

        let result = store.insert(owner, label, None).await;

        assert!(matches!(result, Err(RelogError::InvalidArgument(_))));
        assert_eq!(store.len(), 1);
        // The failed insert did not burn an id
        assert_eq!(store.next_id(), 2);
    }

    #[tokio::test]
    async fn test_lookup_uses_store_clock_when_now_omitted() {
        let (store, clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(10.0)).await.unwrap();

        assert_eq!(store.lookup_by_owner("u1", None).await.unwrap().len(), 1);

        clock.set(10.0);
        assert!(store.lookup_by_owner("u1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_resurrection_without_reclaim() {
        let (store, clock) = store_at(0.0);
        let record = store.insert("u1", "CPU", Some(5.0)).await.unwrap();

        clock.set(6.0);
        assert!(store.lookup_by_owner("u1", None).await.unwrap().is_empty());
        assert!(store
            .lookup_by_creation_time(record.created_at, None)
            .await
            .unwrap()
            .is_empty());
        assert!(store.live_records(None).await.unwrap().is_empty());

        // Still physically present until reclaimed
        assert_eq!(store.count().await.unwrap(), 1);

        clock.set(100.0);
        assert!(store.lookup_by_owner("u1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_by_owner_filters_and_orders() {
        let (store, clock) = store_at(0.0);

        store.insert("u1", "CPU", Some(10.0)).await.unwrap();
        clock.advance(1.0);
        store.insert("u2", "GPU", Some(10.0)).await.unwrap();
        clock.advance(1.0);
        store.insert("u1", "RAM", Some(1.0)).await.unwrap();
        clock.advance(1.0);
        store.insert("u1", "Disk", Some(10.0)).await.unwrap();

        // Liveness only looks at expiry, so Disk (created at 3.0) counts at 2.5 too
        let at_2_5 = store.lookup_by_owner("u1", Some(2.5)).await.unwrap();
        let labels: Vec<_> = at_2_5.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["CPU", "RAM", "Disk"]);

        let at_3_5 = store.lookup_by_owner("u1", Some(3.5)).await.unwrap();
        let labels: Vec<_> = at_3_5.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["CPU", "Disk"]);

        assert!(store.lookup_by_owner("nobody", Some(0.0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_grouping_by_creation_time() {
        let (store, _clock) = store_at(100.0);

        store.insert("u1", "CPU", Some(1.0)).await.unwrap();
        store.insert("u2", "RAM", Some(1.0)).await.unwrap();

        let group = store.lookup_by_creation_time(100.0, Some(100.1)).await.unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].owner, "u1");
        assert_eq!(group[1].owner, "u2");
    }

    #[tokio::test]
    async fn test_creation_time_match_is_exact() {
        let (store, _clock) = store_at(100.25);
        store.insert("u1", "CPU", Some(10.0)).await.unwrap();

        assert!(store
            .lookup_by_creation_time(100.25 + 1e-9, Some(101.0))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.lookup_by_creation_time(100.25, Some(101.0)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_negative_zero_matches_zero() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(1.0)).await.unwrap();

        let found = store.lookup_by_creation_time(-0.0, Some(0.5)).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_creation_time_lookup_excludes_expired() {
        let (store, _clock) = store_at(10.0);
        store.insert("u1", "short", Some(1.0)).await.unwrap();
        store.insert("u2", "long", Some(100.0)).await.unwrap();

        let found = store.lookup_by_creation_time(10.0, Some(20.0)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "long");
    }

    #[tokio::test]
    async fn test_reclaim_boundary_is_inclusive() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(2.0)).await.unwrap();

        assert_eq!(store.reclaim(Some(1.999)).await.unwrap(), 0);
        assert_eq!(store.reclaim(Some(2.0)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reclaim_only_removes_expired() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "a", Some(1.0)).await.unwrap();
        store.insert("u1", "b", Some(2.0)).await.unwrap();
        store.insert("u2", "c", Some(3.0)).await.unwrap();

        assert_eq!(store.reclaim(Some(2.0)).await.unwrap(), 2);
        assert_eq!(store.len(), 1);

        let remaining = store.live_records(Some(2.0)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].label, "c");
    }

    #[tokio::test]
    async fn test_reclaim_drops_empty_index_buckets() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(1.0)).await.unwrap();
        store.insert("u2", "RAM", Some(5.0)).await.unwrap();

        store.reclaim(Some(1.0)).await.unwrap();

        let state = store.state.read();
        assert_eq!(state.by_owner.len(), 1);
        assert!(state.by_owner.contains_key("u2"));
        assert_eq!(state.by_created.len(), 1);
        assert_eq!(state.by_expiry.len(), 1);
    }

    #[tokio::test]
    async fn test_reclaim_nan_removes_nothing() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(1.0)).await.unwrap();

        assert_eq!(store.reclaim(Some(f64::NAN)).await.unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reclaim_uses_store_clock_when_now_omitted() {
        let (store, clock) = store_at(0.0);
        store.insert("u1", "CPU", Some(1.0)).await.unwrap();

        assert_eq!(store.reclaim(None).await.unwrap(), 0);
        clock.set(1.0);
        assert_eq!(store.reclaim(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_never_reused() {
        let (store, _clock) = store_at(0.0);

        let a = store.insert("u1", "a", Some(1.0)).await.unwrap();
        let b = store.insert("u1", "b", Some(1.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.reclaim(Some(5.0)).await.unwrap();
        store.clear();

        let c = store.insert("u1", "c", Some(1.0)).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn test_stats() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "a", Some(1.0)).await.unwrap();
        store.insert("u1", "b", Some(10.0)).await.unwrap();
        store.insert("u2", "c", Some(20.0)).await.unwrap();

        let stats = store.stats(Some(5.0)).await.unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.live_records, 2);
        assert_eq!(stats.expired_records, 1);
        assert_eq!(stats.owners, 2);
        assert_eq!(stats.inserted_total, 3);
        assert_eq!(stats.reclaimed_total, 0);
        assert_eq!(stats.next_id, 4);
        assert_eq!(stats.earliest_created_at, Some(0.0));
        assert_eq!(stats.latest_expires_at, Some(20.0));

        store.reclaim(Some(5.0)).await.unwrap();
        let stats = store.stats(Some(5.0)).await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.expired_records, 0);
        assert_eq!(stats.reclaimed_total, 1);
    }

    #[tokio::test]
    async fn test_snapshot_and_import() {
        let (source, clock) = store_at(0.0);
        source.insert("u1", "a", Some(10.0)).await.unwrap();
        clock.advance(1.0);
        source.insert("u2", "b", Some(10.0)).await.unwrap();

        let records = source.snapshot();
        assert_eq!(records.len(), 2);

        let (target, _clock) = store_at(0.0);
        assert_eq!(target.import(records).unwrap(), 2);
        assert_eq!(target.len(), 2);
        assert_eq!(target.next_id(), 3);

        let found = target.lookup_by_creation_time(1.0, Some(2.0)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner, "u2");
    }

    #[tokio::test]
    async fn test_import_rejects_duplicates_atomically() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "a", Some(10.0)).await.unwrap();

        let batch = vec![
            Record::new(5, "u2", "b", 0.0, 10.0),
            Record::new(1, "u3", "c", 0.0, 10.0),
        ];
        let result = store.import(batch);

        assert!(matches!(result, Err(RelogError::DuplicateRecord(1))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.next_id(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_record() {
        let (store, _clock) = store_at(0.0);
        let mut bad = Record::new(1, "u1", "a", 10.0, 5.0);
        bad.expires_at = 1.0;

        assert!(matches!(store.import(vec![bad]), Err(RelogError::InvalidRecord(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_import_assigns_missing_ids() {
        let (store, _clock) = store_at(0.0);
        store.insert("u1", "a", Some(10.0)).await.unwrap();

        let imported = store
            .import(vec![Record::new(0, "u2", "b", 0.0, 10.0)])
            .unwrap();
        assert_eq!(imported, 1);

        let found = store.lookup_by_owner("u2", Some(1.0)).await.unwrap();
        assert_eq!(found[0].id, 2);
        assert_eq!(store.next_id(), 3);
    }

    #[tokio::test]
    async fn test_import_out_of_order_keeps_owner_order() {
        let (store, _clock) = store_at(0.0);
        store
            .import(vec![
                Record::new(9, "u1", "late", 0.0, 10.0),
                Record::new(3, "u1", "early", 0.0, 10.0),
            ])
            .unwrap();

        let found = store.lookup_by_owner("u1", Some(1.0)).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[tokio::test]
    async fn test_advance_next_id_never_lowers() {
        let store = MemoryStore::new();
        store.advance_next_id(10);
        assert_eq!(store.next_id(), 10);
        store.advance_next_id(4);
        assert_eq!(store.next_id(), 10);
    }

    #[tokio::test]
    async fn test_import_rejects_last_id() {
        let (store, _clock) = store_at(0.0);
        let records = vec![
            Record::new(1, "u1", "a", 0.0, 10.0),
            Record::new(u64::MAX, "u1", "b", 0.0, 10.0),
        ];

        assert!(matches!(store.import(records), Err(RelogError::InvalidRecord(_))));
        assert!(store.is_empty());
        assert_eq!(store.next_id(), FIRST_RECORD_ID);
    }

    #[tokio::test]
    async fn test_insert_fails_when_ids_exhausted() {
        let (store, _clock) = store_at(0.0);
        store.advance_next_id(u64::MAX);

        let result = store.insert("u1", "CPU", None).await;
        assert!(matches!(result, Err(RelogError::InternalError(_))));
        assert!(store.is_empty());
        assert_eq!(store.next_id(), u64::MAX);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StoreConfig::default().with_default_ttl(0.0);
        assert!(matches!(
            MemoryStore::with_config(config),
            Err(RelogError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_insert() {
        use tokio::task::JoinSet;

        let store = Arc::new(MemoryStore::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u32 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .insert(&format!("user{}", i % 10), "CPU", Some(60.0))
                    .await
                    .unwrap()
                    .id
            });
        }

        let mut ids = Vec::new();
        while let Some(result) = tasks.join_next().await {
            ids.push(result.unwrap());
        }

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert_eq!(store.len(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_and_reclaim() {
        use tokio::task::JoinSet;

        let (store, _clock) = store_at(0.0);
        let store = Arc::new(store);
        let mut tasks = JoinSet::new();

        for i in 0..50u32 {
            let store = store.clone();
            tasks.spawn(async move {
                // Even ids expire at t=1, odd ones at t=100
                let ttl = if i % 2 == 0 { 1.0 } else { 100.0 };
                store.insert("u1", "CPU", Some(ttl)).await.unwrap();
                store.reclaim(Some(1.0)).await.unwrap()
            });
        }

        let mut removed = 0;
        while let Some(result) = tasks.join_next().await {
            removed += result.unwrap();
        }
        removed += store.reclaim(Some(1.0)).await.unwrap();

        assert_eq!(removed, 25);
        assert_eq!(store.len(), 25);
        assert_eq!(store.lookup_by_owner("u1", Some(1.0)).await.unwrap().len(), 25);
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #[test]
        fn prop_lookup_matches_liveness(
            ttls in proptest::collection::vec(0.01f64..100.0, 1..40),
            now in 0.0f64..120.0,
        ) {
            let (store, _clock) = store_at(0.0);

            let expected: Vec<u64> = block_on(async {
                let mut expected = Vec::new();
                for ttl in &ttls {
                    let record = store.insert("u1", "r", Some(*ttl)).await.unwrap();
                    if record.expires_at > now {
                        expected.push(record.id);
                    }
                }
                expected
            });

            let before: Vec<u64> = block_on(store.lookup_by_owner("u1", Some(now)))
                .unwrap()
                .iter()
                .map(|r| r.id)
                .collect();
            prop_assert_eq!(&before, &expected);

            let removed = block_on(store.reclaim(Some(now))).unwrap();
            prop_assert_eq!(removed, ttls.len() - expected.len());

            let after: Vec<u64> = block_on(store.lookup_by_owner("u1", Some(now)))
                .unwrap()
                .iter()
                .map(|r| r.id)
                .collect();
            prop_assert_eq!(&after, &expected);

            prop_assert_eq!(block_on(store.reclaim(Some(now))).unwrap(), 0);
        }
    }
}
