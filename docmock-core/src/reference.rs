//! Reference handles for collections and documents.
//!
//! References are cheap handles: an absolute [`Path`] plus an
//! `Arc<dyn StoreBackend>` pointing back at the store that owns the tree.
//! Creating a reference validates the path shape and parity immediately;
//! the nodes themselves are materialised by the backend on first access.
//!
//! # Example
//!
//! ```ignore
//! let users = db.collection("users")?;
//! let alice = users.doc("alice")?;
//!
//! alice.set(doc! { "name": "Alice", "age": 30 }).await?;
//! let friends = alice.collection("friends")?;
//! friends.add(doc! { "name": "Bob" }).await?;
//! ```

use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};
use tracing::warn;
use uuid::Uuid;

use crate::{
    backend::{ListenerId, SetOptions, StoreBackend},
    error::{DocumentStoreError, DocumentStoreResult},
    path::{Path, ReferenceKind},
    query::{Query, SortDirection, WhereOp},
    snapshot::{DocumentSnapshot, QuerySnapshot},
    value::{FieldData, WriteData},
};

const AUTO_ID_LENGTH: usize = 20;

/// Generates an id for documents created without one.
pub fn auto_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(AUTO_ID_LENGTH)
        .collect()
}

/// A handle to a collection.
#[derive(Clone)]
pub struct CollectionReference {
    path: Path,
    backend: Arc<dyn StoreBackend>,
}

impl CollectionReference {
    /// Resolves `relative` against `base` and checks that it addresses a collection.
    pub(crate) fn resolve(
        base: &Path,
        relative: &str,
        backend: Arc<dyn StoreBackend>,
    ) -> DocumentStoreResult<Self> {
        let path = base
            .join(relative)?
            .expect(ReferenceKind::Collection)?;

        Ok(Self { path, backend })
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document owning this collection, or `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference> {
        self.path
            .parent()
            .filter(|parent| !parent.is_empty())
            .map(|path| DocumentReference { path, backend: self.backend.clone() })
    }

    /// The backend this reference reads and writes through.
    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// A document in this collection, addressed by id or by a relative path.
    ///
    /// # Errors
    ///
    /// Returns a path error if `path` is malformed or addresses a collection.
    pub fn doc(&self, path: &str) -> DocumentStoreResult<DocumentReference> {
        DocumentReference::resolve(&self.path, path, self.backend.clone())
    }

    /// A new document with a generated id.
    pub fn doc_auto(&self) -> DocumentReference {
        DocumentReference {
            path: self.path.child(auto_id()),
            backend: self.backend.clone(),
        }
    }

    /// Creates a document with a generated id.
    ///
    /// Validation errors name `add` as the failing operation.
    pub async fn add(&self, data: impl Into<WriteData>) -> DocumentStoreResult<DocumentReference> {
        let reference = self.doc_auto();

        reference
            .set(data)
            .await
            .map_err(|err| match err {
                DocumentStoreError::InvalidData { message, .. } => DocumentStoreError::invalid_data("add", message),
                other => other,
            })?;

        Ok(reference)
    }

    /// Reads every live document in the collection.
    pub async fn get(&self) -> DocumentStoreResult<QuerySnapshot> {
        self.query().get().await
    }

    /// An empty query over this collection.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    pub fn where_field(&self, field: impl Into<String>, op: WhereOp, value: impl Into<FieldData>) -> Query {
        self.query().where_field(field, op, value)
    }

    pub fn order_by(&self, field: impl Into<String>, direction: SortDirection) -> Query {
        self.query().order_by(field, direction)
    }

    pub fn limit(&self, limit: usize) -> Query {
        self.query().limit(limit)
    }

    /// Always fails: a collection has no `order_by` to bound.
    pub fn start_at(&self, value: impl Into<FieldData>) -> DocumentStoreResult<Query> {
        self.query().start_at(value)
    }

    /// Always fails: a collection has no `order_by` to bound.
    pub fn start_after(&self, value: impl Into<FieldData>) -> DocumentStoreResult<Query> {
        self.query().start_after(value)
    }

    /// Always fails: a collection has no `order_by` to bound.
    pub fn end_at(&self, value: impl Into<FieldData>) -> DocumentStoreResult<Query> {
        self.query().end_at(value)
    }

    /// Always fails: a collection has no `order_by` to bound.
    pub fn end_before(&self, value: impl Into<FieldData>) -> DocumentStoreResult<Query> {
        self.query().end_before(value)
    }

    pub fn select<S: Into<String>>(&self, fields: impl IntoIterator<Item = S>) -> Query {
        self.query().select(fields)
    }

    /// Delivers a snapshot of the collection now and after every change to the store.
    pub fn on_snapshot<F>(&self, on_next: F) -> ListenerRegistration
    where
        F: Fn(QuerySnapshot) + Send + Sync + 'static,
    {
        self.query().on_snapshot(on_next)
    }
}

impl fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

/// A handle to a document.
///
/// Two references are equal when their canonical paths are equal.
#[derive(Clone)]
pub struct DocumentReference {
    path: Path,
    backend: Arc<dyn StoreBackend>,
}

impl DocumentReference {
    /// Resolves `relative` against `base` and checks that it addresses a document.
    pub(crate) fn resolve(
        base: &Path,
        relative: &str,
        backend: Arc<dyn StoreBackend>,
    ) -> DocumentStoreResult<Self> {
        let path = base
            .join(relative)?
            .expect(ReferenceKind::Document)?;

        Ok(Self { path, backend })
    }

    /// Rebuilds a reference from an already validated document path.
    pub(crate) fn from_path(path: Path, backend: Arc<dyn StoreBackend>) -> Self {
        Self { path, backend }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionReference {
        CollectionReference {
            path: self.path.parent().unwrap_or_default(),
            backend: self.backend.clone(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// A sub-collection of this document, addressed by id or by a relative path.
    pub fn collection(&self, path: &str) -> DocumentStoreResult<CollectionReference> {
        CollectionReference::resolve(&self.path, path, self.backend.clone())
    }

    /// The sub-collections that have been materialised under this document.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<CollectionReference>> {
        Ok(self
            .backend
            .list_collections(&self.path)
            .await?
            .into_iter()
            .map(|id| CollectionReference {
                path: self.path.child(id),
                backend: self.backend.clone(),
            })
            .collect())
    }

    pub async fn get(&self) -> DocumentStoreResult<DocumentSnapshot> {
        let data = self.backend.get_document(&self.path).await?;

        Ok(DocumentSnapshot::new(self.clone(), data))
    }

    /// Replaces the document's fields. Sub-collections are kept.
    pub async fn set(&self, data: impl Into<WriteData>) -> DocumentStoreResult<()> {
        self.set_with_options(data, SetOptions::default()).await
    }

    pub async fn set_with_options(&self, data: impl Into<WriteData>, options: SetOptions) -> DocumentStoreResult<()> {
        self.backend
            .set_document(&self.path, data.into(), options)
            .await
    }

    /// Updates fields of an existing document. Keys may be dotted paths.
    pub async fn update(&self, data: impl Into<WriteData>) -> DocumentStoreResult<()> {
        self.backend
            .update_document(&self.path, data.into())
            .await
    }

    pub async fn delete(&self) -> DocumentStoreResult<()> {
        self.backend.delete_document(&self.path).await
    }

    /// Delivers a snapshot of this document now and after every change to the store.
    pub fn on_snapshot<F>(&self, on_next: F) -> ListenerRegistration
    where
        F: Fn(DocumentSnapshot) + Send + Sync + 'static,
    {
        let reference = self.clone();

        subscribe(
            &self.backend,
            move || {
                let reference = reference.clone();
                async move { reference.get().await }
            },
            on_next,
        )
    }
}

impl fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

/// Handle returned by `on_snapshot`.
///
/// Dropping it keeps the listener registered; call [`ListenerRegistration::remove`].
#[must_use = "call `remove` to stop receiving snapshots"]
pub struct ListenerRegistration {
    id: Option<ListenerId>,
    backend: Arc<dyn StoreBackend>,
}

impl ListenerRegistration {
    /// Stops delivery to this listener.
    pub fn remove(self) {
        if let Some(id) = self.id {
            self.backend.remove_listener(id);
        }
    }

    /// Whether the backend registered the listener for change delivery.
    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("id", &self.id)
            .finish()
    }
}

/// Schedules one initial delivery and registers a store-wide change listener
/// that re-reads through `fetch` and hands the result to `on_next`.
pub(crate) fn subscribe<S, Fetch, Fut, F>(
    backend: &Arc<dyn StoreBackend>,
    fetch: Fetch,
    on_next: F,
) -> ListenerRegistration
where
    S: Send + 'static,
    Fetch: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DocumentStoreResult<S>> + Send + 'static,
    F: Fn(S) + Send + Sync + 'static,
{
    let fetch = Arc::new(fetch);
    let on_next = Arc::new(on_next);

    let deliver = move || -> BoxFuture<'static, ()> {
        let fetch = fetch.clone();
        let on_next = on_next.clone();

        Box::pin(async move {
            match (*fetch)().await {
                Ok(snapshot) => (*on_next)(snapshot),
                Err(err) => warn!(error = %err, "Snapshot listener failed to read"),
            }
        })
    };

    backend.defer(deliver());
    let id = backend.add_listener(Arc::new(deliver));

    ListenerRegistration { id, backend: backend.clone() }
}
