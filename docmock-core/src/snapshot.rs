//! Point-in-time read results.
//!
//! A [`DocumentSnapshot`] copies a document's fields at read time. Encoded
//! reference strings are turned back into [`DocumentReference`]s on access.
//! A [`QuerySnapshot`] is the ordered list of document snapshots a collection
//! read or query produced.

use bson::{Bson, Document, de::deserialize_from_bson};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::{
    error::DocumentStoreResult,
    path::{Path, ReferenceKind},
    reference::{CollectionReference, DocumentReference},
    value::FieldData,
};

/// The state of one document at the time it was read.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    reference: DocumentReference,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub(crate) fn new(reference: DocumentReference, data: Option<Document>) -> Self {
        Self { reference, data }
    }

    /// Whether the document existed when it was read.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// The reference this snapshot was read from.
    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    /// All top-level fields, or `None` if the document does not exist.
    ///
    /// Top-level reference fields are decoded; values nested inside maps are
    /// returned as stored.
    pub fn data(&self) -> Option<BTreeMap<String, FieldData>> {
        self.data.as_ref().map(|document| {
            document
                .iter()
                .map(|(key, value)| (key.clone(), self.decode(value)))
                .collect()
        })
    }

    /// The raw stored fields, with references still encoded.
    pub fn raw_data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    /// A single field addressed by a dotted path.
    ///
    /// Returns `None` if the document does not exist or any segment is missing.
    pub fn get(&self, field: &str) -> Option<FieldData> {
        let mut segments = field.split('.');
        let first = segments.next()?;
        let mut current = self.data.as_ref()?.get(first)?;

        for segment in segments {
            current = current.as_document()?.get(segment)?;
        }

        Some(self.decode(current))
    }

    /// Deserializes the document into a Rust type.
    ///
    /// Reference fields deserialize as their encoded strings.
    pub fn deserialize<T: DeserializeOwned>(&self) -> DocumentStoreResult<Option<T>> {
        self.data
            .as_ref()
            .map(|document| -> DocumentStoreResult<T> {
                Ok(deserialize_from_bson(Bson::Document(document.clone()))?)
            })
            .transpose()
    }

    fn decode(&self, value: &Bson) -> FieldData {
        match value {
            Bson::String(encoded) => match Path::decode(encoded) {
                Some(path) if path.kind() == Some(ReferenceKind::Document) => FieldData::Reference(
                    DocumentReference::from_path(path, self.reference.backend().clone()),
                ),
                _ => FieldData::Value(value.clone()),
            },
            other => FieldData::Value(other.clone()),
        }
    }
}

/// The ordered result of a collection read or query.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn from_rows(collection: &CollectionReference, rows: Vec<(String, Document)>) -> Self {
        let docs = rows
            .into_iter()
            .map(|(id, data)| {
                let reference = DocumentReference::from_path(collection.path().child(id), collection.backend().clone());
                DocumentSnapshot::new(reference, Some(data))
            })
            .collect();

        Self { docs }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.docs.iter()
    }

    pub fn for_each(&self, callback: impl FnMut(&DocumentSnapshot)) {
        self.docs.iter().for_each(callback);
    }

    /// The document ids in result order.
    pub fn ids(&self) -> Vec<&str> {
        self.docs
            .iter()
            .map(DocumentSnapshot::id)
            .collect()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}
