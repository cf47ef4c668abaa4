//! In-process document store
//!
//! Behaves like a single CouchDB database closely enough for the actions: ids
//! and revisions are store-assigned, every write must present the current
//! revision, deletes leave tombstones, and bulk writes report per-document
//! results instead of failing as a whole.
//!
//! Every call is recorded as a [`StoreCall`] so tests can assert on the exact
//! sequence an action issued, and individual operations can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    BulkResult, Connector, DocRevision, DocumentStore, StoreError, StoreErrorKind,
    StoreOperation, StoreResult, StoreUrl,
};
use crate::todo::TodoDocument;

/// One call made against a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Connect,
    Create,
    Get(String),
    Rev(String),
    Put(String),
    Delete(String),
    AllDocs,
    /// Number of documents in the batch
    BulkDocs(usize),
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u64,
    rev: String,
    doc: TodoDocument,
    deleted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<String, Entry>,
    calls: Vec<StoreCall>,
    failing: HashSet<StoreOperation>,
}

/// Shared in-memory database
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

fn next_rev(generation: u64) -> String {
    format!("{}-{}", generation, Uuid::new_v4().simple())
}

impl Inner {
    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.failing.contains(&operation) {
            return Err(StoreError::database_error(operation, "injected failure"));
        }
        Ok(())
    }

    fn live(&self, operation: StoreOperation, id: &str) -> StoreResult<&Entry> {
        self.docs
            .get(id)
            .filter(|entry| !entry.deleted)
            .ok_or_else(|| StoreError::not_found(operation, id))
    }

    /// CouchDB write rules: an existing document (tombstones included) needs
    /// its current revision; a new id must not claim one.
    fn write(
        &mut self,
        operation: StoreOperation,
        id: &str,
        doc: &TodoDocument,
        deleted: bool,
    ) -> StoreResult<DocRevision> {
        let generation = match self.docs.get(id) {
            Some(entry) if doc.rev.as_deref() == Some(entry.rev.as_str()) => entry.generation + 1,
            Some(entry) if entry.deleted && doc.rev.is_none() => entry.generation + 1,
            None if doc.rev.is_none() => 1,
            _ => return Err(StoreError::conflict(operation, id)),
        };

        let rev = next_rev(generation);
        let mut stored = doc.clone();
        stored.id = Some(id.to_string());
        stored.rev = Some(rev.clone());
        stored.deleted = deleted;
        self.docs.insert(
            id.to_string(),
            Entry {
                generation,
                rev: rev.clone(),
                doc: stored,
                deleted,
            },
        );

        Ok(DocRevision {
            id: id.to_string(),
            rev,
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing call recording
    pub async fn seed(&self, doc: TodoDocument) -> DocRevision {
        let mut inner = self.inner.lock().await;
        let id = doc
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let generation = 1;
        let rev = next_rev(generation);
        let mut stored = doc;
        stored.id = Some(id.clone());
        stored.rev = Some(rev.clone());
        inner.docs.insert(
            id.clone(),
            Entry {
                generation,
                rev: rev.clone(),
                doc: stored,
                deleted: false,
            },
        );
        DocRevision { id, rev }
    }

    /// Make every subsequent call of `operation` fail
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.inner.lock().await.failing.insert(operation);
    }

    /// Calls made so far, oldest first
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.clone()
    }

    /// A live document by id, if present
    pub async fn document(&self, id: &str) -> Option<TodoDocument> {
        let inner = self.inner.lock().await;
        inner
            .docs
            .get(id)
            .filter(|entry| !entry.deleted)
            .map(|entry| entry.doc.clone())
    }

    /// Whether `id` exists as a tombstone
    pub async fn is_deleted(&self, id: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.docs.get(id).is_some_and(|entry| entry.deleted)
    }

    /// Number of live documents
    pub async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.docs.values().filter(|entry| !entry.deleted).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl DocumentStore for MemoryStore {
    async fn create(&self, doc: &TodoDocument) -> StoreResult<DocRevision> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Create);
        inner.check(StoreOperation::Create)?;

        let id = Uuid::new_v4().simple().to_string();
        let mut fresh = doc.clone();
        fresh.rev = None;
        inner.write(StoreOperation::Create, &id, &fresh, false)
    }

    async fn get(&self, id: &str) -> StoreResult<TodoDocument> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Get(id.to_string()));
        inner.check(StoreOperation::Get)?;
        inner
            .live(StoreOperation::Get, id)
            .map(|entry| entry.doc.clone())
    }

    async fn rev(&self, id: &str) -> StoreResult<String> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Rev(id.to_string()));
        inner.check(StoreOperation::Rev)?;
        inner
            .live(StoreOperation::Rev, id)
            .map(|entry| entry.rev.clone())
    }

    async fn put(&self, id: &str, doc: &TodoDocument) -> StoreResult<DocRevision> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Put(id.to_string()));
        inner.check(StoreOperation::Put)?;
        inner.write(StoreOperation::Put, id, doc, doc.deleted)
    }

    async fn delete(&self, id: &str, rev: &str) -> StoreResult<DocRevision> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Delete(id.to_string()));
        inner.check(StoreOperation::Delete)?;

        let current = inner.live(StoreOperation::Delete, id)?.doc.clone();
        let tombstone = TodoDocument {
            rev: Some(rev.to_string()),
            ..current
        };
        inner.write(StoreOperation::Delete, id, &tombstone, true)
    }

    async fn all_docs(&self) -> StoreResult<Vec<TodoDocument>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::AllDocs);
        inner.check(StoreOperation::AllDocs)?;
        Ok(inner
            .docs
            .values()
            .filter(|entry| !entry.deleted)
            .map(|entry| entry.doc.clone())
            .collect())
    }

    async fn bulk_docs(&self, docs: &[TodoDocument]) -> StoreResult<Vec<BulkResult>> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::BulkDocs(docs.len()));
        inner.check(StoreOperation::BulkDocs)?;

        let results = docs
            .iter()
            .map(|doc| {
                let id = doc
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
                match inner.write(StoreOperation::BulkDocs, &id, doc, doc.deleted) {
                    Ok(written) => BulkResult {
                        id,
                        rev: Some(written.rev),
                        error: None,
                        reason: None,
                    },
                    Err(e) => BulkResult {
                        id,
                        rev: None,
                        error: Some(e.kind.to_string()),
                        reason: Some(e.message),
                    },
                }
            })
            .collect();
        Ok(results)
    }
}

/// Connector handing out the same [`MemoryStore`] to every invocation
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    bulk_write_delay: Duration,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            bulk_write_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_bulk_write_delay(mut self, delay: Duration) -> Self {
        self.bulk_write_delay = delay;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl Connector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, _url: &StoreUrl) -> StoreResult<MemoryStore> {
        let mut inner = self.store.inner.lock().await;
        inner.calls.push(StoreCall::Connect);
        if inner.failing.contains(&StoreOperation::Connect) {
            return Err(StoreError::new(
                StoreOperation::Connect,
                StoreErrorKind::ConnectionFailed,
                "injected failure",
            ));
        }
        Ok(self.store.clone())
    }

    fn bulk_write_delay(&self) -> Duration {
        self.bulk_write_delay
    }
}
