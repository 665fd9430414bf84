//! Query evaluation over a collection's live documents.
//!
//! [`QueryEvaluator`] walks a query's operations in evaluation order (sort,
//! cursors, limit, filters) and narrows an ordered list of `(id, fields)` rows.
//! Values are compared through [`Comparable`], which normalises every numeric
//! type to `f64`. Filters and cursors never order values of different types.
//! Sorting uses [`Comparable::sort_cmp`], a total order that ranks types first.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, DateTime, Document};
use tracing::trace;

use docmock_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{CursorKind, QueryOp, QueryVisitor, SortDirection, WhereOp},
};

/// Type-erased, comparable representation of BSON values.
///
/// This is a private implementation detail shared by query evaluation and the
/// array transforms of the write engine.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null, and a missing field when sorting
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value, including encoded references
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON type, equal only to an identical value
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Comparable<'_> {
    /// Type rank for sorting: null, bool, number, datetime, string, array, map, other.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Number(_) => 2,
            Comparable::DateTime(_) => 3,
            Comparable::String(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Map(_) => 6,
            Comparable::Other(_) => 7,
        }
    }

    /// Total order for sorting. Values of different types order by rank; maps
    /// and other values of the same rank are ties.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(left, right)| left.sort_cmp(right))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Equality with numeric normalisation, so `1 == 1.0`.
pub(crate) fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Resolves a dotted field path by descending into nested documents.
pub(crate) fn lookup<'a>(document: &'a Document, field: &str) -> Option<&'a Bson> {
    let mut segments = field.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Narrows an ordered row set by replaying query operations.
pub(crate) struct QueryEvaluator {
    rows: Vec<(String, Document)>,
}

impl QueryEvaluator {
    pub fn new(rows: Vec<(String, Document)>) -> Self {
        Self { rows }
    }

    /// Evaluates `operations` against `rows` and returns the surviving rows in order.
    pub fn evaluate(
        rows: Vec<(String, Document)>,
        operations: &[QueryOp],
    ) -> DocumentStoreResult<Vec<(String, Document)>> {
        let mut evaluator = Self::new(rows);
        evaluator.visit_query(operations)?;

        Ok(evaluator.rows)
    }

    fn retain(&mut self, predicate: impl Fn(&Document) -> bool) {
        let before = self.rows.len();
        self.rows.retain(|(_, document)| predicate(document));
        trace!(before, after = self.rows.len(), "Filtered query rows");
    }
}

impl QueryVisitor for QueryEvaluator {
    type Error = DocumentStoreError;

    fn visit_order_by(&mut self, field: &str, direction: SortDirection) -> Result<(), Self::Error> {
        self.rows.sort_by(|(_, a), (_, b)| {
            let left = lookup(a, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);
            let right = lookup(b, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);

            match direction {
                SortDirection::Asc => left.sort_cmp(&right),
                SortDirection::Desc => right.sort_cmp(&left),
            }
        });

        Ok(())
    }

    fn visit_cursor(&mut self, kind: CursorKind, field: &str, value: &Bson) -> Result<(), Self::Error> {
        let bound = Comparable::from(value);

        self.retain(|document| {
            let Some(ordering) = lookup(document, field)
                .and_then(|field_value| Comparable::from(field_value).partial_cmp(&bound))
            else {
                return false;
            };

            match kind {
                CursorKind::StartAt => ordering != Ordering::Less,
                CursorKind::StartAfter => ordering == Ordering::Greater,
                CursorKind::EndAt => ordering != Ordering::Greater,
                CursorKind::EndBefore => ordering == Ordering::Less,
            }
        });

        Ok(())
    }

    fn visit_limit(&mut self, limit: usize) -> Result<(), Self::Error> {
        self.rows.truncate(limit);
        Ok(())
    }

    fn visit_where(&mut self, field: &str, op: WhereOp, value: &Bson) -> Result<(), Self::Error> {
        let operand = Comparable::from(value);

        self.retain(|document| {
            let Some(field_value) = lookup(document, field) else {
                return false;
            };
            let field_value = Comparable::from(field_value);

            match op {
                WhereOp::Eq => field_value == operand,
                WhereOp::Gt | WhereOp::Gte | WhereOp::Lt | WhereOp::Lte => {
                    match field_value.partial_cmp(&operand) {
                        Some(ordering) => match op {
                            WhereOp::Gt => ordering == Ordering::Greater,
                            WhereOp::Gte => ordering != Ordering::Less,
                            WhereOp::Lt => ordering == Ordering::Less,
                            _ => ordering != Ordering::Greater,
                        },
                        None => false,
                    }
                },
                WhereOp::ArrayContains => match field_value {
                    Comparable::Array(array) => array.iter().any(|item| item == &operand),
                    _ => false,
                },
                WhereOp::ArrayContainsAny => match (&field_value, &operand) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        array.iter().any(|item| values.contains(item))
                    },
                    _ => false,
                },
                WhereOp::In => match &operand {
                    Comparable::Array(values) => values.contains(&field_value),
                    _ => false,
                },
            }
        });

        Ok(())
    }
}
