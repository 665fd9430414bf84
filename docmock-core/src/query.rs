//! Query construction for collection reads.
//!
//! A [`Query`] is an immutable builder: every chained call returns a new query
//! with one more [`QueryOp`] appended. Nothing is evaluated until [`Query::get`].
//!
//! ```ignore
//! let snapshot = db
//!     .collection("users")?
//!     .order_by("age", SortDirection::Asc)
//!     .start_at(18)?
//!     .limit(10)
//!     .where_field("active", WhereOp::Eq, true)
//!     .get()
//!     .await?;
//! ```
//!
//! # Evaluation order
//!
//! Operations are not applied in chain order. Evaluation runs in four phases:
//! every `order_by`, then every cursor, then every `limit`, then every `where`.
//! Within a phase, chain order is kept. Several `where` calls therefore compose
//! as a logical AND applied after any `limit`.

use bson::Bson;
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    reference::{CollectionReference, ListenerRegistration, subscribe},
    snapshot::QuerySnapshot,
    value::FieldData,
};

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (the default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl FromStr for SortDirection {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DocumentStoreError::InvalidOperator(other.to_string())),
        }
    }
}

/// Comparison operators for `where` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOp {
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `==`. A reference operand compares by encoded path.
    Eq,
    /// `>=`
    Gte,
    /// `>`
    Gt,
    /// `array-contains`: the array field holds an element equal to the operand.
    ArrayContains,
    /// `array-contains-any`: the array field shares an element with the operand list.
    ArrayContainsAny,
    /// `in`: the field equals one of the operand list's elements.
    In,
}

impl WhereOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereOp::Lt => "<",
            WhereOp::Lte => "<=",
            WhereOp::Eq => "==",
            WhereOp::Gte => ">=",
            WhereOp::Gt => ">",
            WhereOp::ArrayContains => "array-contains",
            WhereOp::ArrayContainsAny => "array-contains-any",
            WhereOp::In => "in",
        }
    }
}

impl FromStr for WhereOp {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(WhereOp::Lt),
            "<=" => Ok(WhereOp::Lte),
            "==" => Ok(WhereOp::Eq),
            ">=" => Ok(WhereOp::Gte),
            ">" => Ok(WhereOp::Gt),
            "array-contains" => Ok(WhereOp::ArrayContains),
            "array-contains-any" => Ok(WhereOp::ArrayContainsAny),
            "in" => Ok(WhereOp::In),
            other => Err(DocumentStoreError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for WhereOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four query cursors. Each bounds the first `order_by` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// Keep documents whose ordering field is `>=` the value.
    StartAt,
    /// Keep documents whose ordering field is `>` the value.
    StartAfter,
    /// Keep documents whose ordering field is `<=` the value.
    EndAt,
    /// Keep documents whose ordering field is `<` the value.
    EndBefore,
}

impl CursorKind {
    pub fn method_name(&self) -> &'static str {
        match self {
            CursorKind::StartAt => "startAt",
            CursorKind::StartAfter => "startAfter",
            CursorKind::EndAt => "endAt",
            CursorKind::EndBefore => "endBefore",
        }
    }
}

/// One accumulated query operation.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// Stable sort on a (possibly dotted) field.
    OrderBy {
        field: String,
        direction: SortDirection,
    },
    /// A bound on the field of the first `order_by`.
    Cursor {
        kind: CursorKind,
        field: String,
        value: Bson,
    },
    /// Keep the first `n` documents.
    Limit(usize),
    /// Keep documents matching the predicate. Reference operands are already encoded.
    Where {
        field: String,
        op: WhereOp,
        value: Bson,
    },
}

impl QueryOp {
    /// Evaluation phase: lower phases run first.
    pub fn phase(&self) -> u8 {
        match self {
            QueryOp::OrderBy { .. } => 0,
            QueryOp::Cursor { .. } => 1,
            QueryOp::Limit(_) => 2,
            QueryOp::Where { .. } => 3,
        }
    }
}

/// Orders operations for evaluation, keeping chain order within a phase.
pub fn evaluation_order(operations: &[QueryOp]) -> Vec<&QueryOp> {
    let mut ordered = operations.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|op| op.phase());
    ordered
}

/// A filtered, ordered and bounded view over a collection.
#[derive(Debug, Clone)]
pub struct Query {
    collection: CollectionReference,
    operations: Vec<QueryOp>,
}

impl Query {
    pub(crate) fn new(collection: CollectionReference) -> Self {
        Self { collection, operations: Vec::new() }
    }

    /// The collection this query reads.
    pub fn collection(&self) -> &CollectionReference {
        &self.collection
    }

    /// The operations accumulated so far, in chain order.
    pub fn operations(&self) -> &[QueryOp] {
        &self.operations
    }

    /// Adds a filter on a (possibly dotted) field.
    pub fn where_field(mut self, field: impl Into<String>, op: WhereOp, value: impl Into<FieldData>) -> Self {
        self.operations.push(QueryOp::Where {
            field: field.into(),
            op,
            value: value.into().to_bson(),
        });
        self
    }

    /// Orders results by a field.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.operations.push(QueryOp::OrderBy { field: field.into(), direction });
        self
    }

    /// Keeps at most `limit` documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.operations.push(QueryOp::Limit(limit));
        self
    }

    /// Keeps documents whose ordering field is `>=` the value.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CursorWithoutOrderBy`] if no `order_by` precedes it.
    pub fn start_at(self, value: impl Into<FieldData>) -> DocumentStoreResult<Self> {
        self.cursor(CursorKind::StartAt, value)
    }

    /// Keeps documents whose ordering field is `>` the value.
    pub fn start_after(self, value: impl Into<FieldData>) -> DocumentStoreResult<Self> {
        self.cursor(CursorKind::StartAfter, value)
    }

    /// Keeps documents whose ordering field is `<=` the value.
    pub fn end_at(self, value: impl Into<FieldData>) -> DocumentStoreResult<Self> {
        self.cursor(CursorKind::EndAt, value)
    }

    /// Keeps documents whose ordering field is `<` the value.
    pub fn end_before(self, value: impl Into<FieldData>) -> DocumentStoreResult<Self> {
        self.cursor(CursorKind::EndBefore, value)
    }

    /// Field projection. Accepted for API compatibility; all fields are returned.
    pub fn select<S: Into<String>>(self, _fields: impl IntoIterator<Item = S>) -> Self {
        self
    }

    fn cursor(mut self, kind: CursorKind, value: impl Into<FieldData>) -> DocumentStoreResult<Self> {
        let field = self
            .operations
            .iter()
            .find_map(|op| match op {
                QueryOp::OrderBy { field, .. } => Some(field.clone()),
                _ => None,
            })
            .ok_or_else(|| DocumentStoreError::CursorWithoutOrderBy {
                cursor: kind.method_name().to_string(),
            })?;

        self.operations.push(QueryOp::Cursor {
            kind,
            field,
            value: value.into().to_bson(),
        });

        Ok(self)
    }

    /// Evaluates the query against the live documents of the collection.
    pub async fn get(&self) -> DocumentStoreResult<QuerySnapshot> {
        debug!(collection = %self.collection.path(), operations = self.operations.len(), "Running query");

        let rows = self
            .collection
            .backend()
            .query_documents(self.collection.path(), &self.operations)
            .await?;

        Ok(QuerySnapshot::from_rows(&self.collection, rows))
    }

    /// Delivers a snapshot of this query now and after every change to the store.
    pub fn on_snapshot<F>(&self, on_next: F) -> ListenerRegistration
    where
        F: Fn(QuerySnapshot) + Send + Sync + 'static,
    {
        let query = self.clone();

        subscribe(
            self.collection.backend(),
            move || {
                let query = query.clone();
                async move { query.get().await }
            },
            on_next,
        )
    }
}

/// Visitor over query operations in evaluation order.
///
/// Backends implement the four `visit_*` callbacks; [`QueryVisitor::visit_query`]
/// drives them through [`evaluation_order`].
pub trait QueryVisitor {
    type Error: Into<DocumentStoreError>;

    fn visit_order_by(&mut self, field: &str, direction: SortDirection) -> Result<(), Self::Error>;
    fn visit_cursor(&mut self, kind: CursorKind, field: &str, value: &Bson) -> Result<(), Self::Error>;
    fn visit_limit(&mut self, limit: usize) -> Result<(), Self::Error>;
    fn visit_where(&mut self, field: &str, op: WhereOp, value: &Bson) -> Result<(), Self::Error>;

    fn visit_op(&mut self, op: &QueryOp) -> Result<(), Self::Error> {
        match op {
            QueryOp::OrderBy { field, direction } => self.visit_order_by(field, *direction),
            QueryOp::Cursor { kind, field, value } => self.visit_cursor(*kind, field, value),
            QueryOp::Limit(limit) => self.visit_limit(*limit),
            QueryOp::Where { field, op, value } => self.visit_where(field, *op, value),
        }
    }

    fn visit_query(&mut self, operations: &[QueryOp]) -> Result<(), Self::Error> {
        for op in evaluation_order(operations) {
            self.visit_op(op)?;
        }

        Ok(())
    }
}
