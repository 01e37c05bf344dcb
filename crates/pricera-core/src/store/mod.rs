//! Storage abstractions for the pipeline.
//!
//! The [`ObjectStore`] trait holds uploaded chains; the [`RecordStore`]
//! trait holds one JSON status record per source URL. Both are consumed
//! through `Arc<dyn …>` so the same pipeline code runs against S3 and SQLite
//! in production and the in-memory stores in [`memory`] under test.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{BulkWriteError, OperationFailure, RecordStoreError, StorageError};

/// Blob storage for serialized chains.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](ObjectStore::get) | Read an object; absent keys are [`StorageError::NotFound`] |
/// | [`put`](ObjectStore::put) | Write an object in one request |
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// One `$set`-style upsert against the record keyed by `url`.
///
/// Keys of `set` are dotted paths (`pricera.rozetka_product.crawl_status`);
/// missing intermediate objects are created.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOp {
    pub url: String,
    pub set: BTreeMap<String, Value>,
}

impl UpsertOp {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            set: BTreeMap::new(),
        }
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(path.into(), value.into());
        self
    }
}

/// What a single upsert did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Inserted,
    Modified,
    Unchanged,
}

/// Counts for a bulk upsert that fully applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteSummary {
    pub inserted: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl BulkWriteSummary {
    pub fn record(&mut self, result: WriteResult) {
        match result {
            WriteResult::Inserted => self.inserted += 1,
            WriteResult::Modified => self.modified += 1,
            WriteResult::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.modified + self.unchanged
    }
}

/// Persistent store of status records keyed by source URL.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Apply one upsert, creating the record if it does not exist.
    async fn upsert_one(&self, op: &UpsertOp) -> Result<WriteResult, RecordStoreError>;

    /// Apply a batch of upserts without ordering guarantees.
    ///
    /// A failing operation does not stop the others. The default is
    /// [`upsert_each`]; stores that can tell up front that the whole batch
    /// will fail return [`BulkWriteError::Batch`] instead.
    async fn bulk_upsert(&self, ops: &[UpsertOp]) -> Result<BulkWriteSummary, BulkWriteError> {
        upsert_each(self, ops).await
    }

    /// Fetch the stored record for a URL.
    async fn find_one(&self, url: &str) -> Result<Option<Value>, RecordStoreError>;
}

/// Run [`RecordStore::upsert_one`] for every operation, collecting every
/// failure into [`BulkWriteError::Partial`].
pub async fn upsert_each<S>(store: &S, ops: &[UpsertOp]) -> Result<BulkWriteSummary, BulkWriteError>
where
    S: RecordStore + ?Sized,
{
    let mut summary = BulkWriteSummary::default();
    let mut failures = Vec::new();

    for (index, op) in ops.iter().enumerate() {
        match store.upsert_one(op).await {
            Ok(result) => summary.record(result),
            Err(e) => failures.push(OperationFailure {
                index,
                url: op.url.clone(),
                message: e.to_string(),
            }),
        }
    }

    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(BulkWriteError::Partial {
            attempted: ops.len(),
            failures,
        })
    }
}

/// Apply every `$set` of an upsert to a document.
pub fn apply_upsert(document: &mut Value, op: &UpsertOp) {
    for (path, value) in &op.set {
        set_path(document, path, value.clone());
    }
}

/// Set a dotted path inside a JSON document, creating objects on the way.
///
/// A non-object value found on the path is replaced by an object.
pub fn set_path(document: &mut Value, path: &str, value: Value) {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
