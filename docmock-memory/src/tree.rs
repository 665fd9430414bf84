//! The in-memory document tree and path resolution over it.
//!
//! The tree alternates collection and document levels: the root holds
//! collections, collections hold documents, documents hold fields plus their
//! own sub-collections. Nodes are created on first resolution and never removed;
//! a deleted document stays addressable and a later `set` makes it live again.

use bson::Document;
use indexmap::{IndexMap, map::Entry};
use tracing::trace;

use docmock_core::{
    error::DocumentStoreResult,
    path::{Path, ReferenceKind},
};

/// Existence state of an addressable document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentState {
    /// Referenced but never written.
    #[default]
    Unmaterialized,
    /// Written and not deleted since.
    Live,
    /// Explicitly deleted. Fields are cleared; sub-collections survive.
    Deleted,
}

/// A document: its state, its fields, and its sub-collections.
///
/// Sub-collections are kept apart from fields so a field can never shadow one.
#[derive(Debug, Clone, Default)]
pub struct DocumentNode {
    pub(crate) state: DocumentState,
    pub(crate) fields: Document,
    pub(crate) collections: IndexMap<String, CollectionNode>,
}

impl DocumentNode {
    pub(crate) fn live(fields: Document) -> Self {
        Self {
            state: DocumentState::Live,
            fields,
            collections: IndexMap::new(),
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn exists(&self) -> bool {
        self.state == DocumentState::Live
    }

    /// The document's fields if it exists.
    pub fn data(&self) -> Option<&Document> {
        self.exists().then_some(&self.fields)
    }

    pub fn collection_ids(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}

/// A collection: documents keyed by id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CollectionNode {
    pub(crate) documents: IndexMap<String, DocumentNode>,
}

impl CollectionNode {
    /// The documents that currently exist, as `(id, fields)` pairs.
    pub fn live_documents(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.documents
            .iter()
            .filter_map(|(id, node)| node.data().map(|data| (id.as_str(), data)))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The root of a store.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    pub(crate) collections: IndexMap<String, CollectionNode>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a document path, creating every missing node along the way.
    pub fn document_mut(&mut self, path: &Path) -> DocumentStoreResult<&mut DocumentNode> {
        let path = path.clone().expect(ReferenceKind::Document)?;
        let (ancestors, leaf) = path.segments().split_at(path.len() - 2);

        let collection = materialise_collection(self.collections_mut(ancestors), &leaf[0]);
        Ok(materialise_document(collection, &leaf[1]))
    }

    /// Resolves a collection path, creating every missing node along the way.
    pub fn collection_mut(&mut self, path: &Path) -> DocumentStoreResult<&mut CollectionNode> {
        let path = path.clone().expect(ReferenceKind::Collection)?;
        let (ancestors, leaf) = path.segments().split_at(path.len() - 1);

        Ok(materialise_collection(self.collections_mut(ancestors), &leaf[0]))
    }

    /// Looks up a document without materialising anything.
    pub fn document(&self, path: &Path) -> Option<&DocumentNode> {
        if path.kind() != Some(ReferenceKind::Document) {
            return None;
        }

        let mut collections = &self.collections;
        let mut node = None;

        for pair in path.segments().chunks(2) {
            let document = collections.get(&pair[0])?.documents.get(&pair[1])?;
            collections = &document.collections;
            node = Some(document);
        }

        node
    }

    /// Ids of the collections directly under `parent`, or the root collections
    /// when `parent` is the root path.
    pub fn collection_ids(&self, parent: &Path) -> Vec<String> {
        let collections = if parent.is_empty() {
            &self.collections
        } else {
            match self.document(parent) {
                Some(node) => &node.collections,
                None => return Vec::new(),
            }
        };

        collections.keys().cloned().collect()
    }

    /// Walks `(collection, document)` pairs from the root and returns the
    /// sub-collection map of the last document.
    fn collections_mut(&mut self, pairs: &[String]) -> &mut IndexMap<String, CollectionNode> {
        let mut collections = &mut self.collections;

        for pair in pairs.chunks(2) {
            let collection = materialise_collection(collections, &pair[0]);
            collections = &mut materialise_document(collection, &pair[1]).collections;
        }

        collections
    }
}

fn materialise_collection<'a>(
    collections: &'a mut IndexMap<String, CollectionNode>,
    id: &str,
) -> &'a mut CollectionNode {
    match collections.entry(id.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            trace!(collection = id, "Materialising collection node");
            entry.insert(CollectionNode::default())
        }
    }
}

fn materialise_document<'a>(collection: &'a mut CollectionNode, id: &str) -> &'a mut DocumentNode {
    match collection.documents.entry(id.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            trace!(document = id, "Materialising document node");
            entry.insert(DocumentNode::default())
        }
    }
}
