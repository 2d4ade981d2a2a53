//! Source document access.
//!
//! The importer pulls objects out of already-parsed source documents through
//! the [`SourceResolver`] trait. Parsing itself (tokenizing, cross-reference
//! resolution, stream decoding) lives behind this boundary: any reader that
//! can hand back decoded objects by number can feed the importer.

use crate::error::{Error, Result};
use crate::object::Object;

/// Identifier of a registered source reader.
///
/// Handed out by the importer when a reader is registered; all subsequent
/// import and copy operations name the source through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) usize);

impl SourceId {
    /// Index of this source in registration order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "src{}", self.0)
    }
}

/// Resolves object numbers to decoded objects of one source document.
///
/// # Errors
///
/// Implementations signal a missing object with [`Error::ObjectNotFound`];
/// the copier substitutes a null object for those and continues. Every other
/// error is treated as structural corruption and aborts composition.
pub trait SourceResolver {
    /// Resolve the object stored under `object_number`.
    fn resolve(&mut self, object_number: u32) -> Result<Object>;
}

/// In-memory source document backed by an object map.
///
/// Useful for tests and for callers that parse source documents themselves.
#[derive(Debug, Default)]
pub struct MemorySource {
    objects: std::collections::HashMap<u32, Object>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` under `object_number`, replacing any previous value.
    pub fn insert(&mut self, object_number: u32, object: Object) -> &mut Self {
        self.objects.insert(object_number, object);
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, object_number: u32, object: Object) -> Self {
        self.objects.insert(object_number, object);
        self
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the source holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl SourceResolver for MemorySource {
    fn resolve(&mut self, object_number: u32) -> Result<Object> {
        self.objects
            .get(&object_number)
            .cloned()
            .ok_or(Error::ObjectNotFound(object_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_resolve() {
        let mut source = MemorySource::new().with(3, Object::Integer(7));
        assert_eq!(source.resolve(3).unwrap(), Object::Integer(7));
    }

    #[test]
    fn test_memory_source_missing_is_not_found() {
        let mut source = MemorySource::new();
        match source.resolve(12) {
            Err(Error::ObjectNotFound(12)) => {},
            other => panic!("expected ObjectNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_source_id_display() {
        assert_eq!(format!("{}", SourceId(2)), "src2");
    }
}
