//! In-memory record store with time-to-live support
//!
//! The whole table sits behind one `RwLock`. Reads share it; `put` and
//! `sweep_expired` take it exclusively. Expired records are removed lazily on
//! read and proactively by the sweeper, both through [`Record::is_expired`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// Current time in Unix seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A stored value with its optional absolute expiry (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub value: String,
    pub expires_at: Option<u64>,
}

impl Record {
    /// Build a record written at `now`; `ttl` of `None` makes it permanent.
    pub fn new(value: String, ttl: Option<u64>, now: u64) -> Self {
        Self {
            value,
            expires_at: ttl.map(|secs| now.saturating_add(secs)),
        }
    }

    /// The one expiry predicate shared by lazy reads and the sweeper
    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Trait defining the interface for record storage operations
pub trait Store: Send + Sync {
    /// Insert or overwrite `key`, discarding any previous expiry
    async fn put(&self, key: String, value: String, ttl: Option<u64>);

    /// Read `key`, deleting it instead if it has expired
    async fn get(&self, key: &str) -> Option<Record>;

    /// Delete every record expired as of `now`; returns how many went
    async fn sweep_expired(&self, now: u64) -> usize;

    /// Number of records held, expired or not
    async fn len(&self) -> usize;
}

/// Thread-safe in-memory record store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` and run `after` before giving up exclusive access.
    ///
    /// Anything that must be ordered exactly like the mutations themselves
    /// (the write log append) goes in `after`.
    pub async fn put_and_then<F, T>(
        &self,
        key: String,
        value: String,
        ttl: Option<u64>,
        after: F,
    ) -> T
    where
        F: FnOnce() -> T,
    {
        let mut records = self.records.write().await;
        records.insert(key, Record::new(value, ttl, unix_now()));
        after()
    }

    /// `get` against an explicit clock
    pub async fn get_at(&self, key: &str, now: u64) -> Option<Record> {
        {
            let records = self.records.read().await;
            match records.get(key) {
                None => return None,
                Some(record) if !record.is_expired(now) => return Some(record.clone()),
                Some(_) => {}
            }
        }

        // Escalate for the delete. Another writer may have replaced the
        // record since the shared read, so check again.
        let mut records = self.records.write().await;
        if records.get(key).is_some_and(|r| r.is_expired(now)) {
            records.remove(key);
            return None;
        }
        records.get(key).cloned()
    }

    /// Raw presence check, with no lazy expiry
    pub async fn contains_key(&self, key: &str) -> bool {
        self.records.read().await.contains_key(key)
    }

    /// Every key currently held, expired or not
    pub async fn keys(&self) -> Vec<String> {
        self.records.read().await.keys().cloned().collect()
    }
}

impl Store for MemoryStore {
    async fn put(&self, key: String, value: String, ttl: Option<u64>) {
        self.put_and_then(key, value, ttl, || ()).await
    }

    async fn get(&self, key: &str) -> Option<Record> {
        self.get_at(key, unix_now()).await
    }

    async fn sweep_expired(&self, now: u64) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
