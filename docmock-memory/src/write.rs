//! The write engine: payload validation and value resolution.
//!
//! A write runs in two passes. [`validate`] walks the whole payload and rejects
//! it before anything is touched. [`apply_set`] and [`apply_update`] then
//! resolve each [`FieldValue`] against the old value of the field it targets,
//! turning sentinels into concrete values or into a tombstone that removes the
//! key. Sentinels never reach the tree.

use bson::{Bson, DateTime, Document};

use docmock_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    path::Path,
    value::{FieldValue, WriteData},
};

use crate::{
    evaluator::values_equal,
    tree::{DocumentNode, DocumentState},
};

/// The shape of a write, as far as validation and resolution care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Set { merge: bool },
    Update,
}

impl WriteKind {
    fn operation(&self) -> &'static str {
        match self {
            WriteKind::Set { .. } => "set",
            WriteKind::Update => "update",
        }
    }
}

/// Where in the payload a value sits.
#[derive(Debug, Clone, Copy)]
struct Placement {
    in_object: bool,
    in_array: bool,
}

/// Checks every value of a payload before any of it is applied.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidData`] naming the offending field for
/// undefined values, misplaced `delete`/`increment` sentinels, non-numeric
/// increment operands, sentinels inside arrays and `update` keys with an empty
/// path segment.
pub fn validate(data: &WriteData, kind: WriteKind) -> DocumentStoreResult<()> {
    let top_level = Placement { in_object: false, in_array: false };

    for (key, value) in data.iter() {
        if kind == WriteKind::Update && key.split('.').any(str::is_empty) {
            return Err(DocumentStoreError::invalid_data(
                kind.operation(),
                format!(
                    "Invalid field path ({key}). Paths must not be empty, begin with '.', end with '.', or contain '..'"
                ),
            ));
        }

        validate_value(value, key, kind, top_level)?;
    }

    Ok(())
}

fn validate_value(value: &FieldValue, field: &str, kind: WriteKind, placement: Placement) -> DocumentStoreResult<()> {
    let invalid = |message: String| Err(DocumentStoreError::invalid_data(kind.operation(), message));

    match value {
        FieldValue::Map(data) => {
            let nested = Placement { in_object: true, ..placement };

            for (key, value) in data.iter() {
                validate_value(value, &format!("{field}.{key}"), kind, nested)?;
            }
        }
        FieldValue::Array(items) => {
            let nested = Placement { in_array: true, ..placement };

            for item in items {
                validate_value(item, field, kind, nested)?;
            }
        }
        FieldValue::Value(value) if contains_undefined(value) => {
            return invalid(format!("Unsupported field value: undefined (found in field {field})"));
        }
        FieldValue::ArrayUnion(elements) | FieldValue::ArrayRemove(elements)
            if elements.iter().any(contains_undefined) =>
        {
            return invalid(format!("Unsupported field value: undefined (found in field {field})"));
        }
        FieldValue::Delete if kind == WriteKind::Set { merge: false } => {
            return invalid(format!(
                "FieldValue.delete() cannot be used with set() unless you pass {{merge:true}} (found in field {field})"
            ));
        }
        FieldValue::Delete if kind == WriteKind::Update && placement.in_object => {
            return invalid(format!(
                "FieldValue.delete() can only appear at the top level of your update data (found in field {field})"
            ));
        }
        FieldValue::Increment(_) if kind == WriteKind::Set { merge: false } => {
            return invalid(format!(
                "FieldValue.increment() cannot be used with set() unless you pass {{merge:true}} (found in field {field})"
            ));
        }
        FieldValue::Increment(operand) if as_number(operand).is_none() => {
            return invalid(format!(
                "FieldValue.increment() requires a numeric operand (found in field {field})"
            ));
        }
        _ => {}
    }

    if let Some(name) = value.sentinel_name()
        && placement.in_array
    {
        return invalid(format!("{name}() is not currently supported inside arrays"));
    }

    Ok(())
}

fn contains_undefined(value: &Bson) -> bool {
    match value {
        Bson::Undefined => true,
        Bson::Array(items) => items.iter().any(contains_undefined),
        Bson::Document(document) => document.values().any(contains_undefined),
        _ => false,
    }
}

/// The outcome of resolving one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Store this value.
    Value(Bson),
    /// Remove the key.
    Tombstone,
}

/// Resolves a new value against the old value of the same field.
///
/// Nested maps merge into the old map when `merge` is set and are built from
/// the new keys alone otherwise.
pub fn resolve(new: FieldValue, old: Option<&Bson>, merge: bool, now: DateTime) -> Resolved {
    let value = match new {
        FieldValue::Value(value) => value,
        FieldValue::Reference(reference) => Bson::String(reference.path().encode()),
        FieldValue::Map(data) => {
            let base = match old {
                Some(Bson::Document(old)) if merge => old.clone(),
                _ => Document::new(),
            };

            Bson::Document(resolve_fields(base, data, merge, now))
        }
        FieldValue::Array(items) => Bson::Array(
            items
                .into_iter()
                .filter_map(|item| match resolve(item, None, false, now) {
                    Resolved::Value(value) => Some(value),
                    Resolved::Tombstone => None,
                })
                .collect(),
        ),
        FieldValue::Increment(operand) => increment(old, operand),
        FieldValue::ArrayUnion(elements) => {
            let mut array = old_array(old);

            for element in elements {
                if !array.iter().any(|item| values_equal(item, &element)) {
                    array.push(element);
                }
            }

            Bson::Array(array)
        }
        FieldValue::ArrayRemove(elements) => {
            let mut array = old_array(old);
            array.retain(|item| !elements.iter().any(|element| values_equal(item, element)));

            Bson::Array(array)
        }
        FieldValue::ServerTimestamp => Bson::DateTime(now),
        FieldValue::Delete => return Resolved::Tombstone,
    };

    Resolved::Value(value)
}

/// Resolves each field of `data` against `base` and writes the result into it.
fn resolve_fields(mut base: Document, data: WriteData, merge: bool, now: DateTime) -> Document {
    for (key, value) in data {
        match resolve(value, base.get(&key), merge, now) {
            Resolved::Value(value) => {
                base.insert(key, value);
            }
            Resolved::Tombstone => {
                base.remove(&key);
            }
        }
    }

    base
}

fn old_array(old: Option<&Bson>) -> Vec<Bson> {
    match old {
        Some(Bson::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(*value as f64),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

/// Adds `operand` to a numeric old value. Integers stay integers while the sum fits.
fn increment(old: Option<&Bson>, operand: Bson) -> Bson {
    match (old, &operand) {
        (Some(Bson::Int32(a)), Bson::Int32(b)) => a
            .checked_add(*b)
            .map(Bson::Int32)
            .unwrap_or_else(|| Bson::Int64(*a as i64 + *b as i64)),
        (Some(Bson::Int32(a)), Bson::Int64(b)) | (Some(Bson::Int64(b)), Bson::Int32(a)) => (*a as i64)
            .checked_add(*b)
            .map(Bson::Int64)
            .unwrap_or_else(|| Bson::Double(*a as f64 + *b as f64)),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => a
            .checked_add(*b)
            .map(Bson::Int64)
            .unwrap_or_else(|| Bson::Double(*a as f64 + *b as f64)),
        (Some(old), operand) => match (as_number(old), as_number(operand)) {
            (Some(a), Some(b)) => Bson::Double(a + b),
            _ => operand.clone(),
        },
        (None, operand) => operand.clone(),
    }
}

/// Applies a `set` to a document node and makes it live.
///
/// Without `merge` every field is replaced; sub-collections are kept either way.
pub fn apply_set(node: &mut DocumentNode, data: WriteData, merge: bool, now: DateTime) -> DocumentStoreResult<()> {
    validate(&data, WriteKind::Set { merge })?;

    let base = if merge && node.exists() {
        std::mem::take(&mut node.fields)
    } else {
        Document::new()
    };

    node.fields = resolve_fields(base, data, merge, now);
    node.state = DocumentState::Live;

    Ok(())
}

/// Applies an `update` to a live document node.
///
/// Dotted keys address nested fields; siblings at every level are kept and
/// missing intermediate maps are created.
///
/// # Errors
///
/// Returns [`DocumentStoreError::DocumentDoesNotExist`] unless the node is live.
pub fn apply_update(node: &mut DocumentNode, path: &Path, data: WriteData, now: DateTime) -> DocumentStoreResult<()> {
    if !node.exists() {
        return Err(DocumentStoreError::DocumentDoesNotExist { path: path.to_string() });
    }

    validate(&data, WriteKind::Update)?;

    let mut fields = node.fields.clone();

    for (key, value) in data {
        let segments = key.split('.').collect::<Vec<_>>();
        update_nested(&mut fields, &segments, value, now);
    }

    node.fields = fields;

    Ok(())
}

fn update_nested(document: &mut Document, segments: &[&str], value: FieldValue, now: DateTime) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        match resolve(value, document.get(*first), false, now) {
            Resolved::Value(value) => {
                document.insert(*first, value);
            }
            Resolved::Tombstone => {
                document.remove(*first);
            }
        }

        return;
    }

    if !matches!(document.get(*first), Some(Bson::Document(_))) {
        document.insert(*first, Document::new());
    }

    if let Some(Bson::Document(child)) = document.get_mut(*first) {
        update_nested(child, rest, value, now);
    }
}

/// Marks a document node deleted and clears its fields.
pub fn apply_delete(node: &mut DocumentNode) {
    node.state = DocumentState::Deleted;
    node.fields.clear();
}
