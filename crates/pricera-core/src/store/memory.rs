//! In-memory [`ObjectStore`] and [`RecordStore`] implementations.
//!
//! Used by tests and by dry runs. State lives in `HashMap`s behind
//! `std::sync::RwLock`. Both stores support failure injection so the
//! pipeline's retry and isolation rules can be exercised deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BulkWriteError, RecordStoreError, StorageError};

use super::{
    apply_upsert, upsert_each, BulkWriteSummary, ObjectStore, RecordStore, UpsertOp, WriteResult,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// A stored object with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    /// Remaining injected `put` failures per key.
    failures: RwLock<HashMap<String, usize>>,
    put_attempts: RwLock<HashMap<String, usize>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` `put` calls for `key` fail with an I/O error.
    ///
    /// `usize::MAX` makes every call fail.
    pub fn fail_puts(&self, key: &str, times: usize) {
        write(&self.failures).insert(key.to_string(), times);
    }

    /// Number of `put` calls seen for `key`, failed ones included.
    pub fn put_attempts(&self, key: &str) -> usize {
        read(&self.put_attempts).get(key).copied().unwrap_or(0)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        read(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.objects).is_empty()
    }

    /// Insert an object directly, bypassing failure injection.
    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) {
        write(&self.objects).insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        *write(&self.put_attempts).entry(key.to_string()).or_insert(0) += 1;

        {
            let mut failures = write(&self.failures);
            if let Some(remaining) = failures.get_mut(key) {
                if *remaining > 0 {
                    if *remaining != usize::MAX {
                        *remaining -= 1;
                    }
                    return Err(StorageError::io(bucket, key, "injected failure"));
                }
            }
        }

        self.insert(bucket, key, body, content_type);
        Ok(())
    }
}

/// In-memory record store: one JSON document per URL.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Value>>,
    failing_urls: RwLock<HashSet<String>>,
    unreachable: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert for `url` fail.
    pub fn fail_url(&self, url: &str) {
        write(&self.failing_urls).insert(url.to_string());
    }

    /// Simulate a lost connection: every write fails, bulk writes as a whole.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn is_unreachable(&self) -> bool {
        self.unreachable.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.records).is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn upsert_one(&self, op: &UpsertOp) -> Result<WriteResult, RecordStoreError> {
        if self.is_unreachable() {
            return Err(RecordStoreError("record store unreachable".to_string()));
        }
        if read(&self.failing_urls).contains(&op.url) {
            return Err(RecordStoreError(format!("injected failure for {}", op.url)));
        }

        let mut records = write(&self.records);
        match records.get_mut(&op.url) {
            Some(doc) => {
                let before = doc.clone();
                apply_upsert(doc, op);
                if *doc == before {
                    Ok(WriteResult::Unchanged)
                } else {
                    Ok(WriteResult::Modified)
                }
            }
            None => {
                let mut doc = Value::Object(serde_json::Map::new());
                apply_upsert(&mut doc, op);
                records.insert(op.url.clone(), doc);
                Ok(WriteResult::Inserted)
            }
        }
    }

    async fn bulk_upsert(&self, ops: &[UpsertOp]) -> Result<BulkWriteSummary, BulkWriteError> {
        if self.is_unreachable() {
            return Err(BulkWriteError::Batch("record store unreachable".to_string()));
        }
        upsert_each(self, ops).await
    }

    async fn find_one(&self, url: &str) -> Result<Option<Value>, RecordStoreError> {
        Ok(read(&self.records).get(url).cloned())
    }
}
