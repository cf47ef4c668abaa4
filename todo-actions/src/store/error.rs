//! Document store error types
//!
//! Every failure coming back from the document store is described by a
//! [`StoreError`]: which call was being made, what category of failure it was,
//! and which document (if any) was involved.
//!
//! # Example
//!
//! ```rust
//! use todo_actions::store::{StoreError, StoreErrorKind, StoreOperation};
//!
//! let error = StoreError::not_found(StoreOperation::Get, "4f2a");
//! assert!(matches!(error.kind, StoreErrorKind::NotFound));
//! assert_eq!(error.doc_id.as_deref(), Some("4f2a"));
//! ```

use std::fmt;

use http::StatusCode;

/// Store call being made when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Opening the database
    Connect,
    /// Creating a document with a store-assigned id
    Create,
    /// Reading one document
    Get,
    /// Reading the current revision of a document
    Rev,
    /// Writing a document at a known revision
    Put,
    /// Deleting a document at a known revision
    Delete,
    /// Listing every document with its body
    AllDocs,
    /// Writing many documents in one batch
    BulkDocs,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Create => write!(f, "create"),
            Self::Get => write!(f, "get"),
            Self::Rev => write!(f, "rev"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
            Self::AllDocs => write!(f, "all_docs"),
            Self::BulkDocs => write!(f, "bulk_docs"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Document or database does not exist
    NotFound,
    /// Revision token was stale at write time
    Conflict,
    /// Credentials were rejected
    Unauthorized,
    /// The store tier's request rate was exceeded
    RateLimited,
    /// The store could not be reached
    ConnectionFailed,
    /// The request timed out
    Timeout,
    /// A document could not be encoded or decoded
    SerializationError,
    /// Any other failure reported by the store
    DatabaseError,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

impl StoreErrorKind {
    /// Classify an HTTP status returned by the store
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            _ => Self::DatabaseError,
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The call being made when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The document involved, when there is one
    pub doc_id: Option<String>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(
        operation: StoreOperation,
        kind: StoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            doc_id: None,
        }
    }

    /// Create a "not found" error for a document
    pub fn not_found(operation: StoreOperation, doc_id: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::NotFound, "Document not found").with_doc(doc_id)
    }

    /// Create a revision conflict error for a document
    pub fn conflict(operation: StoreOperation, doc_id: impl Into<String>) -> Self {
        Self::new(
            operation,
            StoreErrorKind::Conflict,
            "Document update conflict",
        )
        .with_doc(doc_id)
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::Connect,
            StoreErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a serialization error
    pub fn serialization_error(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::SerializationError, message)
    }

    /// Create a generic database error
    pub fn database_error(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::DatabaseError, message)
    }

    /// Build an error from a non-success HTTP status and the store's reason
    pub fn from_status(
        operation: StoreOperation,
        status: StatusCode,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(operation, StoreErrorKind::from_status(status), reason)
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn from_transport(operation: StoreOperation, error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            StoreErrorKind::Timeout
        } else if error.is_connect() {
            StoreErrorKind::ConnectionFailed
        } else if error.is_decode() {
            StoreErrorKind::SerializationError
        } else if let Some(status) = error.status() {
            StoreErrorKind::from_status(status)
        } else {
            StoreErrorKind::DatabaseError
        };
        Self::new(operation, kind, error.without_url().to_string())
    }

    /// Attach the id of the document involved
    #[must_use]
    pub fn with_doc(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    /// Check if this error is transient
    ///
    /// Nothing in this crate retries; the flag is reported in logs so operators
    /// can tell a flaky store from a broken request.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout | StoreErrorKind::RateLimited
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref doc_id) = self.doc_id {
            write!(f, " [doc: {}]", doc_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}
