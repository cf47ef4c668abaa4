//! Document store access
//!
//! Actions never talk HTTP to the database directly. They go through two
//! traits:
//!
//! - [`Connector`]: turns a store URL into an open [`DocumentStore`]. One
//!   connection is opened per invocation and dropped when the action returns.
//! - [`DocumentStore`]: the handful of document calls the actions need
//!   (create, get, rev, put, delete, all_docs, bulk_docs).
//!
//! [`CouchConnector`] speaks the CouchDB HTTP API (Cloudant included);
//! `MemoryConnector` keeps documents in process and is what the test suites
//! run against. It is only built for tests or with the `testing` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_actions::store::{Connector, DocumentStore, StoreResult, StoreUrl};
//!
//! async fn count_todos<C: Connector>(connector: &C, url: &StoreUrl) -> StoreResult<usize> {
//!     let db = connector.connect(url).await?;
//!     Ok(db.all_docs().await?.len())
//! }
//! ```

mod couch;
mod error;
#[cfg(any(test, feature = "testing"))]
mod memory;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::todo::TodoDocument;

pub use couch::{CouchConnector, CouchDatabase};
pub use error::{StoreError, StoreErrorKind, StoreOperation};
#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryConnector, MemoryStore, StoreCall};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Id and revision assigned by the store after a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRevision {
    pub id: String,
    pub rev: String,
}

/// Outcome of one document inside a bulk write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BulkResult {
    /// Whether the store accepted this document
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Validated document store URL
///
/// Credentials embedded in the URL are kept for authentication but never
/// shown: `Display` prints the redacted form.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreUrl(Url);

impl StoreUrl {
    /// Parse and validate a store URL (`http` or `https` only)
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported scheme '{}'", other)),
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err("url has no host".to_string());
        }
        Ok(Self(url))
    }

    /// The full URL, credentials included
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The URL with credentials redacted
    pub fn sanitized(&self) -> String {
        if self.0.username().is_empty() && self.0.password().is_none() {
            return self.0.to_string();
        }
        sanitize_url(self.0.as_str())
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sanitized())
    }
}

impl fmt::Debug for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreUrl").field(&self.sanitized()).finish()
    }
}

/// Sanitize a store URL by removing credentials
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            if at_pos > scheme_end {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos + 1..];
                return format!("{}<redacted>@{}", scheme, after_at);
            }
        }
    }
    url.to_string()
}

/// Opens a connection to the document store
///
/// Implementations carry the store options (database name, timeouts, the
/// bulk-write delay); the URL comes from each invocation's parameters.
pub trait Connector: Send + Sync {
    /// Open store handle
    type Store: DocumentStore;

    /// Connect to the configured database at `url`
    fn connect(&self, url: &StoreUrl) -> impl Future<Output = StoreResult<Self::Store>> + Send;

    /// Pause taken before a bulk write to stay under the store's rate limit
    fn bulk_write_delay(&self) -> Duration;
}

/// Document calls against the todo collection
///
/// Mutations take the revision the caller read immediately before; a stale
/// revision fails with [`StoreErrorKind::Conflict`].
pub trait DocumentStore: Send + Sync {
    /// Create a document; the store assigns the id and first revision
    fn create(&self, doc: &TodoDocument) -> impl Future<Output = StoreResult<DocRevision>> + Send;

    /// Fetch a live document by id
    fn get(&self, id: &str) -> impl Future<Output = StoreResult<TodoDocument>> + Send;

    /// Fetch the current revision of a live document
    fn rev(&self, id: &str) -> impl Future<Output = StoreResult<String>> + Send;

    /// Write `doc` under `id`; `doc.rev` must be the current revision
    fn put(
        &self,
        id: &str,
        doc: &TodoDocument,
    ) -> impl Future<Output = StoreResult<DocRevision>> + Send;

    /// Delete the document at revision `rev`
    fn delete(&self, id: &str, rev: &str) -> impl Future<Output = StoreResult<DocRevision>> + Send;

    /// Every live document, bodies included, design documents excluded
    fn all_docs(&self) -> impl Future<Output = StoreResult<Vec<TodoDocument>>> + Send;

    /// Write all `docs` in one request; results come back per document
    fn bulk_docs(
        &self,
        docs: &[TodoDocument],
    ) -> impl Future<Output = StoreResult<Vec<BulkResult>>> + Send;
}
