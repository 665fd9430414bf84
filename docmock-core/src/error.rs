//! Error types and result types for document store operations.
//!
//! Every failure is reported to the caller of the operation that detected it.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// The variants fall into three groups: path-shape errors (malformed paths, wrong
/// segment parity), write-validation errors (rejected payloads), and precondition
/// errors (updating a missing document, cursors without an ordering). Reads never
/// fail because a document is missing; they yield a non-existent snapshot instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentStoreError {
    /// The path contains an empty segment.
    #[error("Invalid path ({path}). Paths must not contain // in them.")]
    MalformedPath {
        /// The offending path as given by the caller.
        path: String,
    },
    /// A collection reference was requested for a path with an even number of segments.
    #[error(
        "Invalid collection reference. Collection references must have an odd number of segments, but {path} has {segments}."
    )]
    InvalidCollectionReference {
        /// The full path from the store root.
        path: String,
        /// The number of segments in `path`.
        segments: usize,
    },
    /// A document reference was requested for a path with an odd number of segments.
    #[error(
        "Invalid document reference. Document references must have an even number of segments, but {path} has {segments}."
    )]
    InvalidDocumentReference {
        /// The full path from the store root.
        path: String,
        /// The number of segments in `path`.
        segments: usize,
    },
    /// The payload of a write was rejected before anything was applied.
    #[error("Function DocumentReference.{operation}() called with invalid data. {message}")]
    InvalidData {
        /// The write kind (`set`, `update` or `add`).
        operation: String,
        /// What was wrong, naming the offending field.
        message: String,
    },
    /// `update` was called on a document that does not exist.
    #[error("Document doesn't exist: {path}")]
    DocumentDoesNotExist {
        /// Canonical path of the target document.
        path: String,
    },
    /// A cursor was added to a query that has no `order_by`.
    #[error("{cursor}() queries requires orderBy()")]
    CursorWithoutOrderBy {
        /// The cursor method name (`startAt`, `startAfter`, `endAt`, `endBefore`).
        cursor: String,
    },
    /// An unrecognised `where` operator string.
    #[error("Invalid query operator: {0}")]
    InvalidOperator(String),
    /// Serialization/deserialization error when converting between BSON, JSON and Rust types.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization, such as a badly shaped fixture.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl DocumentStoreError {
    /// Builds a write-validation error for the given write kind.
    pub fn invalid_data(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DocumentStoreError::InvalidData {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for malformed paths and segment-parity errors.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::MalformedPath { .. }
                | DocumentStoreError::InvalidCollectionReference { .. }
                | DocumentStoreError::InvalidDocumentReference { .. }
        )
    }
}

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
