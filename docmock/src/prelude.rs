//! Convenient re-exports of commonly used types from docmock.
//!
//! ```ignore
//! use docmock::prelude::*;
//! ```
//!
//! This provides access to:
//! - The store entry point, references and snapshots
//! - Write payloads and field-value sentinels
//! - Query construction
//! - Backend traits and error types

pub use docmock_core::{
    backend::{SetOptions, StoreBackend, StoreBackendBuilder},
    batch::{Transaction, WriteBatch},
    error::{DocumentStoreError, DocumentStoreResult},
    path::Path,
    query::{Query, SortDirection, WhereOp},
    reference::{CollectionReference, DocumentReference, ListenerRegistration},
    snapshot::{DocumentSnapshot, QuerySnapshot},
    store::Firestore,
    value::{FieldData, FieldValue, FieldValues, WriteData},
};
