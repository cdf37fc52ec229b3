//! Record stores.
//!
//! A [`RecordStore`] is the collection behind an entity service. The
//! [`MemoryStore`] owns its records outright: it is seeded at construction,
//! hands out copies only, and is discarded by dropping it (or consumed with
//! [`MemoryStore::into_records`]). The remote variant lives in
//! [`crate::remote`].

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::record::Record;

/// Generic CRUD surface over one entity's collection.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Every record, as an owned copy.
    async fn list(&self) -> StoreResult<Vec<R>>;

    async fn get(&self, id: u64) -> StoreResult<Option<R>>;

    /// Assign an identifier, fill defaults, and append.
    async fn insert(&self, draft: R::Draft) -> StoreResult<R>;

    /// Merge `patch` into the record with `id`. `Ok(None)` when there is no such record.
    async fn update(&self, id: u64, patch: R::Patch) -> StoreResult<Option<R>>;

    /// Whether a record was actually removed.
    async fn remove(&self, id: u64) -> StoreResult<bool>;
}

/// Artificial delay applied before each in-memory operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
}

impl Latency {
    pub const NONE: Latency = Latency { read: Duration::ZERO, write: Duration::ZERO };

    /// Round-trip feel of a hosted backend.
    pub const SIMULATED: Latency =
        Latency { read: Duration::from_millis(200), write: Duration::from_millis(300) };

    pub fn uniform(ms: u64) -> Self {
        let d = Duration::from_millis(ms);
        Latency { read: d, write: d }
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

struct MemoryState<R> {
    records: Vec<R>,
    /// Next identifier to hand out. Never decreases, so deleted ids are not reused.
    next_id: u64,
}

/// In-process store over an owned, ordered `Vec`.
pub struct MemoryStore<R> {
    state: Mutex<MemoryState<R>>,
    latency: Latency,
}

impl<R: Record> MemoryStore<R> {
    pub fn new(latency: Latency) -> Self {
        Self::seeded(Vec::new(), latency)
    }

    pub fn seeded(records: Vec<R>, latency: Latency) -> Self {
        Self::resumed(records, 0, latency)
    }

    /// Seed with a previously saved high-water mark. The next id handed out is
    /// the larger of `next_id` and one past the highest seeded id.
    pub fn resumed(records: Vec<R>, next_id: u64, latency: Latency) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        for id in records.iter().map(Record::id) {
            if !seen.insert(id) {
                tracing::warn!(record = R::LABEL, id, "duplicate id in seed data");
            }
        }
        let next_id = next_id.max(seen.into_iter().max().unwrap_or(0) + 1);
        MemoryStore {
            state: Mutex::new(MemoryState { records, next_id }),
            latency,
        }
    }

    /// Copy of the current contents, without simulated latency.
    pub async fn snapshot(&self) -> Vec<R> {
        self.state.lock().await.records.clone()
    }

    /// Contents plus the next id to hand out, read under one lock.
    pub async fn checkpoint(&self) -> (Vec<R>, u64) {
        let state = self.state.lock().await;
        (state.records.clone(), state.next_id)
    }

    pub fn into_records(self) -> Vec<R> {
        self.state.into_inner().records
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn list(&self) -> StoreResult<Vec<R>> {
        pause(self.latency.read).await;
        Ok(self.state.lock().await.records.clone())
    }

    async fn get(&self, id: u64) -> StoreResult<Option<R>> {
        pause(self.latency.read).await;
        let state = self.state.lock().await;
        Ok(state.records.iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, draft: R::Draft) -> StoreResult<R> {
        pause(self.latency.write).await;
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        let record = R::from_draft(id, draft, Utc::now());
        state.records.push(record.clone());
        tracing::debug!(record = R::LABEL, id, "inserted");
        Ok(record)
    }

    async fn update(&self, id: u64, patch: R::Patch) -> StoreResult<Option<R>> {
        pause(self.latency.write).await;
        let mut state = self.state.lock().await;
        let Some(record) = state.records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        record.apply(patch, Utc::now());
        Ok(Some(record.clone()))
    }

    async fn remove(&self, id: u64) -> StoreResult<bool> {
        pause(self.latency.read).await;
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|r| r.id() != id);
        Ok(state.records.len() != before)
    }
}
