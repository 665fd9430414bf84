//! Slash-delimited paths and the segment-parity rule.
//!
//! A path alternates collection ids and document ids from the store root:
//! `users` is a collection, `users/alice` a document, `users/alice/friends`
//! a collection again. Collection paths have an odd number of segments,
//! document paths an even number, and no segment may be empty.

use std::fmt;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Tag that marks a stored string as an encoded document reference.
pub const REFERENCE_PREFIX: &str = "__ref__:";

/// The kind of node a path is expected to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A collection: odd segment count.
    Collection,
    /// A document: even segment count.
    Document,
}

/// An absolute, validated path from the store root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The empty path, addressing the store root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a path string.
    ///
    /// A single leading separator is ignored. Any empty segment, including a
    /// trailing separator or an empty string, is rejected.
    pub fn parse(path: &str) -> DocumentStoreResult<Self> {
        Self::root().join(path)
    }

    /// Appends a relative path string to this path.
    pub fn join(&self, relative: &str) -> DocumentStoreResult<Self> {
        let malformed = || DocumentStoreError::MalformedPath { path: relative.to_string() };

        if relative.contains("//") {
            return Err(malformed());
        }

        let cleaned = relative
            .strip_prefix(SEPARATOR)
            .unwrap_or(relative);
        let mut segments = self.segments.clone();

        for segment in cleaned.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(malformed());
            }

            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Returns a child path with a single extra segment.
    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id.into());

        Self { segments }
    }

    /// Checks the segment parity against the expected kind.
    pub fn expect(self, kind: ReferenceKind) -> DocumentStoreResult<Self> {
        let segments = self.len();

        match kind {
            ReferenceKind::Collection if segments % 2 != 1 => {
                Err(DocumentStoreError::InvalidCollectionReference { path: self.to_string(), segments })
            }
            ReferenceKind::Document if segments == 0 || segments % 2 != 0 => {
                Err(DocumentStoreError::InvalidDocumentReference { path: self.to_string(), segments })
            }
            _ => Ok(self),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The kind of node this path addresses, or `None` for the root.
    pub fn kind(&self) -> Option<ReferenceKind> {
        match self.len() {
            0 => None,
            n if n % 2 == 1 => Some(ReferenceKind::Collection),
            _ => Some(ReferenceKind::Document),
        }
    }

    /// The last segment.
    pub fn id(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The path with its last segment removed, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_empty() {
            return None;
        }

        Some(Self { segments: self.segments[..self.len() - 1].to_vec() })
    }

    /// Encodes this path as a tagged reference string.
    pub fn encode(&self) -> String {
        format!("{REFERENCE_PREFIX}{self}")
    }

    /// Decodes a tagged reference string, returning `None` for any other string.
    pub fn decode(value: &str) -> Option<Self> {
        let path = value.strip_prefix(REFERENCE_PREFIX)?;
        let segments = path
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        Some(Self { segments })
    }

    /// Returns `true` when `value` carries the reference tag.
    pub fn is_encoded(value: &str) -> bool {
        value.starts_with(REFERENCE_PREFIX)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
