//! Write payloads, field-value sentinels and read values.
//!
//! Writes carry [`FieldValue`]s: plain BSON, nested maps and arrays, document
//! references, or one of the transform sentinels produced by [`FieldValues`].
//! Sentinels are instructions for the write engine and never reach the stored
//! tree. Reads hand back [`FieldData`], which turns encoded reference strings
//! back into live [`DocumentReference`]s.

use bson::{Bson, DateTime, Document, ser::serialize_to_bson};
use serde::Serialize;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    reference::DocumentReference,
};

/// A single value in a write payload.
///
/// Nested BSON documents and arrays are normalised into [`FieldValue::Map`] and
/// [`FieldValue::Array`] on conversion, so [`FieldValue::Value`] only ever holds
/// scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A scalar BSON value.
    Value(Bson),
    /// A nested object.
    Map(WriteData),
    /// An array. Sentinels are rejected inside arrays.
    Array(Vec<FieldValue>),
    /// A reference to another document, stored in encoded form.
    Reference(DocumentReference),
    /// Adds the operand to the old numeric value, or seeds the field with it.
    Increment(Bson),
    /// Appends each element not already present in the old array.
    ArrayUnion(Vec<Bson>),
    /// Removes every element equal to one of these from the old array.
    ArrayRemove(Vec<Bson>),
    /// Removes the field.
    Delete,
    /// Resolves to the time the write is applied.
    ServerTimestamp,
}

impl FieldValue {
    /// The client-facing name of a sentinel, or `None` for plain values.
    pub fn sentinel_name(&self) -> Option<&'static str> {
        match self {
            FieldValue::Increment(_) => Some("FieldValue.increment"),
            FieldValue::ArrayUnion(_) => Some("FieldValue.arrayUnion"),
            FieldValue::ArrayRemove(_) => Some("FieldValue.arrayRemove"),
            FieldValue::Delete => Some("FieldValue.delete"),
            FieldValue::ServerTimestamp => Some("FieldValue.serverTimestamp"),
            FieldValue::Value(_) | FieldValue::Map(_) | FieldValue::Array(_) | FieldValue::Reference(_) => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel_name().is_some()
    }
}

/// Factory for field-value sentinels.
///
/// ```ignore
/// doc_ref.update(
///     WriteData::new()
///         .field("visits", FieldValues::increment(1))
///         .field("tags", FieldValues::array_union(["rust"]))
///         .field("legacy", FieldValues::delete()),
/// ).await?;
/// ```
pub struct FieldValues;

impl FieldValues {
    /// Increments a numeric field by `operand`.
    pub fn increment(operand: impl Into<Bson>) -> FieldValue {
        FieldValue::Increment(operand.into())
    }

    /// Adds the given elements to an array field, skipping ones already present.
    pub fn array_union<T: Into<Bson>>(elements: impl IntoIterator<Item = T>) -> FieldValue {
        FieldValue::ArrayUnion(elements.into_iter().map(Into::into).collect())
    }

    /// Removes all instances of the given elements from an array field.
    pub fn array_remove<T: Into<Bson>>(elements: impl IntoIterator<Item = T>) -> FieldValue {
        FieldValue::ArrayRemove(elements.into_iter().map(Into::into).collect())
    }

    /// Deletes the field.
    pub fn delete() -> FieldValue {
        FieldValue::Delete
    }

    /// Sets the field to the time of the write.
    pub fn server_timestamp() -> FieldValue {
        FieldValue::ServerTimestamp
    }
}

/// An ordered set of fields to write.
///
/// Keys passed to `update` may be dotted (`"address.city"`) to target a nested field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteData {
    fields: Vec<(String, FieldValue)>,
}

impl WriteData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing an earlier entry with the same key.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes any `Serialize` type into write data.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if the value does not serialize to a document.
    pub fn from_serialize<T: Serialize>(value: &T) -> DocumentStoreResult<Self> {
        match serialize_to_bson(value)? {
            Bson::Document(document) => Ok(Self::from(document)),
            other => Err(DocumentStoreError::Serialization(format!(
                "expected a document, got {:?}",
                other.element_type()
            ))),
        }
    }
}

impl IntoIterator for WriteData {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for WriteData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = WriteData::new();

        for (key, value) in iter {
            data.insert(key, value);
        }

        data
    }
}

impl From<Document> for WriteData {
    fn from(document: Document) -> Self {
        document.into_iter().collect()
    }
}

impl From<Bson> for FieldValue {
    fn from(value: Bson) -> Self {
        match value {
            Bson::Document(document) => FieldValue::Map(WriteData::from(document)),
            Bson::Array(items) => FieldValue::Array(items.into_iter().map(FieldValue::from).collect()),
            other => FieldValue::Value(other),
        }
    }
}

impl From<Document> for FieldValue {
    fn from(document: Document) -> Self {
        FieldValue::Map(WriteData::from(document))
    }
}

impl From<WriteData> for FieldValue {
    fn from(data: WriteData) -> Self {
        FieldValue::Map(data)
    }
}

impl From<DocumentReference> for FieldValue {
    fn from(reference: DocumentReference) -> Self {
        FieldValue::Reference(reference)
    }
}

impl From<&DocumentReference> for FieldValue {
    fn from(reference: &DocumentReference) -> Self {
        FieldValue::Reference(reference.clone())
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Value(Bson::Null), Into::into)
    }
}

/// A field value as seen by readers, and the operand type of query filters.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    /// Any stored value other than a reference.
    Value(Bson),
    /// A decoded document reference.
    Reference(DocumentReference),
}

impl FieldData {
    /// Builds a list operand for `in` and `array-contains-any` filters.
    pub fn list<T: Into<FieldData>>(items: impl IntoIterator<Item = T>) -> Self {
        FieldData::Value(Bson::Array(
            items
                .into_iter()
                .map(|item| item.into().to_bson())
                .collect(),
        ))
    }

    /// The stored representation: references are encoded as tagged path strings.
    pub fn to_bson(&self) -> Bson {
        match self {
            FieldData::Value(value) => value.clone(),
            FieldData::Reference(reference) => Bson::String(reference.path().encode()),
        }
    }

    pub fn as_bson(&self) -> Option<&Bson> {
        match self {
            FieldData::Value(value) => Some(value),
            FieldData::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&DocumentReference> {
        match self {
            FieldData::Reference(reference) => Some(reference),
            FieldData::Value(_) => None,
        }
    }

    /// The value as a UTC timestamp, if it is one.
    pub fn as_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            FieldData::Value(Bson::DateTime(value)) => Some(value.to_chrono()),
            _ => None,
        }
    }
}

impl PartialEq<Bson> for FieldData {
    fn eq(&self, other: &Bson) -> bool {
        self.as_bson() == Some(other)
    }
}

impl From<DocumentReference> for FieldData {
    fn from(reference: DocumentReference) -> Self {
        FieldData::Reference(reference)
    }
}

impl From<&DocumentReference> for FieldData {
    fn from(reference: &DocumentReference) -> Self {
        FieldData::Reference(reference.clone())
    }
}

impl From<Bson> for FieldData {
    fn from(value: Bson) -> Self {
        FieldData::Value(value)
    }
}

impl<T: Into<FieldData>> From<Vec<T>> for FieldData {
    fn from(items: Vec<T>) -> Self {
        FieldData::list(items)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::from(Bson::from(value))
                }
            }

            impl From<$ty> for FieldData {
                fn from(value: $ty) -> Self {
                    FieldData::Value(Bson::from(value))
                }
            }
        )*
    };
}

impl_from_scalar!(&str, String, bool, i32, i64, f64, DateTime);

impl From<chrono::DateTime<chrono::Utc>> for FieldValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        FieldValue::Value(Bson::DateTime(DateTime::from_chrono(value)))
    }
}
