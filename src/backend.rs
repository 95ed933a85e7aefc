//! Remote store boundary
//!
//! `SyncBackend` is the sync engine's only view of the hosted store. It is
//! injected where the engine is constructed, so tests run against a
//! recording mock with no global state.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::remote::Collection;

pub mod http;

/// Contract with the hosted per-user store: parallel per-collection reads
/// scoped to an owner, batch upserts keyed by row id, and single-row
/// deletes for explicit user deletions.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// `select * where owner = {owner}` for one collection.
    async fn fetch_rows(
        &self,
        collection: Collection,
        owner: &str,
    ) -> Result<Vec<serde_json::Value>, BackendError>;

    /// Batch upsert, conflict on id, replacing remote row contents.
    async fn upsert_rows(
        &self,
        collection: Collection,
        owner: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), BackendError>;

    /// Delete one row by id.
    async fn delete_row(
        &self,
        collection: Collection,
        owner: &str,
        id: &str,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory backend that records every call, for assertions on call
    /// counts, pushed rows, and overlap behavior.
    #[derive(Default)]
    pub struct MockBackend {
        rows: Mutex<HashMap<Collection, Vec<serde_json::Value>>>,
        pub fetch_calls: AtomicUsize,
        pub delete_calls: AtomicUsize,
        /// One entry per upsert batch, in call order.
        pub upsert_log: Mutex<Vec<Collection>>,
        pub fail_fetch: Mutex<HashSet<Collection>>,
        pub fail_upsert: Mutex<HashSet<Collection>>,
        /// Sleep inside each upsert, to simulate a slow in-flight push.
        pub upsert_delay: Mutex<Option<Duration>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, collection: Collection, rows: Vec<serde_json::Value>) {
            self.rows.lock().unwrap().insert(collection, rows);
        }

        pub fn rows_for(&self, collection: Collection) -> Vec<serde_json::Value> {
            self.rows
                .lock()
                .unwrap()
                .get(&collection)
                .cloned()
                .unwrap_or_default()
        }

        pub fn upsert_batches(&self, collection: Collection) -> usize {
            self.upsert_log
                .lock()
                .unwrap()
                .iter()
                .filter(|c| **c == collection)
                .count()
        }

        fn row_id(row: &serde_json::Value) -> Option<&str> {
            row.get("id").and_then(|v| v.as_str())
        }
    }

    #[async_trait]
    impl SyncBackend for MockBackend {
        async fn fetch_rows(
            &self,
            collection: Collection,
            _owner: &str,
        ) -> Result<Vec<serde_json::Value>, BackendError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.lock().unwrap().contains(&collection) {
                return Err(BackendError::api(500, "simulated read failure"));
            }
            Ok(self.rows_for(collection))
        }

        async fn upsert_rows(
            &self,
            collection: Collection,
            _owner: &str,
            rows: Vec<serde_json::Value>,
        ) -> Result<(), BackendError> {
            self.upsert_log.lock().unwrap().push(collection);
            let delay = *self.upsert_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_upsert.lock().unwrap().contains(&collection) {
                return Err(BackendError::api(500, "simulated write failure"));
            }

            let mut stored = self.rows.lock().unwrap();
            let existing = stored.entry(collection).or_default();
            for row in rows {
                match Self::row_id(&row)
                    .and_then(|id| existing.iter().position(|r| Self::row_id(r) == Some(id)))
                {
                    Some(i) => existing[i] = row,
                    None => existing.push(row),
                }
            }
            Ok(())
        }

        async fn delete_row(
            &self,
            collection: Collection,
            _owner: &str,
            id: &str,
        ) -> Result<(), BackendError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.rows.lock().unwrap();
            if let Some(rows) = stored.get_mut(&collection) {
                rows.retain(|r| Self::row_id(r) != Some(id));
            }
            Ok(())
        }
    }
}
