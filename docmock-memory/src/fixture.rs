//! Seeding a document tree from fixture data.
//!
//! A fixture nests collections under `__collection__` and documents under
//! `__doc__`, starting from the root:
//!
//! ```json
//! {
//!   "__collection__": {
//!     "users": {
//!       "__doc__": {
//!         "user_a": {
//!           "age": 15,
//!           "__collection__": { "friends": { "__doc__": { "user_b": {} } } }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Every seeded document is live. Sub-collections are kept apart from fields.

use bson::{Bson, Document, ser::serialize_to_bson};
use indexmap::IndexMap;
use tracing::{debug, warn};

use docmock_core::error::{DocumentStoreError, DocumentStoreResult};

use crate::tree::{CollectionNode, DocumentNode, DocumentTree};

/// Key holding the collections of the root or of a document.
pub const COLLECTION_KEY: &str = "__collection__";
/// Key holding the documents of a collection.
pub const DOCUMENT_KEY: &str = "__doc__";

/// Builds a tree from a BSON fixture.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Initialization`] if a collection or document
/// entry is not a map.
pub fn load(fixture: &Document) -> DocumentStoreResult<DocumentTree> {
    let mut collections = IndexMap::new();

    for (key, value) in fixture {
        if key == COLLECTION_KEY {
            collections = load_collections(value, "")?;
        } else {
            warn!(key = %key, "Skipping unknown root fixture entry");
        }
    }

    debug!(collections = collections.len(), "Loaded fixture");

    Ok(DocumentTree { collections })
}

/// Builds a tree from a JSON fixture.
pub fn load_json(fixture: &serde_json::Value) -> DocumentStoreResult<DocumentTree> {
    match serialize_to_bson(fixture)? {
        Bson::Document(document) => load(&document),
        other => Err(DocumentStoreError::Initialization(format!(
            "fixture must be an object, got {:?}",
            other.element_type()
        ))),
    }
}

fn as_map<'a>(value: &'a Bson, path: &str) -> DocumentStoreResult<&'a Document> {
    value.as_document().ok_or_else(|| {
        DocumentStoreError::Initialization(format!("fixture entry {path} must be a map"))
    })
}

fn load_collections(value: &Bson, parent: &str) -> DocumentStoreResult<IndexMap<String, CollectionNode>> {
    let mut collections = IndexMap::new();

    for (id, collection) in as_map(value, &format!("{parent}{COLLECTION_KEY}"))? {
        let path = format!("{parent}{id}");
        collections.insert(id.clone(), load_collection(collection, &path)?);
    }

    Ok(collections)
}

fn load_collection(value: &Bson, path: &str) -> DocumentStoreResult<CollectionNode> {
    let mut collection = CollectionNode::default();

    for (key, documents) in as_map(value, path)? {
        if key != DOCUMENT_KEY {
            warn!(collection = path, key = %key, "Skipping unknown collection fixture entry");
            continue;
        }

        for (id, document) in as_map(documents, path)? {
            let document_path = format!("{path}/{id}");
            collection
                .documents
                .insert(id.clone(), load_document(document, &document_path)?);
        }
    }

    Ok(collection)
}

fn load_document(value: &Bson, path: &str) -> DocumentStoreResult<DocumentNode> {
    let mut fields = as_map(value, path)?.clone();

    let collections = match fields.remove(COLLECTION_KEY) {
        Some(collections) => load_collections(&collections, &format!("{path}/"))?,
        None => IndexMap::new(),
    };

    Ok(DocumentNode { collections, ..DocumentNode::live(fields) })
}
