//! Object graph copier.
//!
//! Drains one source's pending copy queue into the output. Dependencies are
//! discovered lazily: while an object is serialized, every reference to a
//! not-yet-seen object of the same source reserves an output number and joins
//! the queue. The full dependency set is never computed up front, so objects
//! unreachable from the seeded entry points are never copied.

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::source::{SourceId, SourceResolver};
use crate::writer::{ObjectSerializer, ObjectWriter};
use std::collections::HashMap;

use super::PendingCopyQueue;

/// Work-list copier over one source's object graph.
pub struct GraphCopier<'a> {
    /// Source being drained
    pub(crate) source: SourceId,
    /// Accessor for the source's objects
    pub(crate) resolver: &'a mut dyn SourceResolver,
    /// Numbers scheduled but not yet copied
    pub(crate) queue: &'a mut PendingCopyQueue,
    /// Source object number -> output object number
    pub(crate) map: &'a mut HashMap<u32, u32>,
}

impl<'a> GraphCopier<'a> {
    /// Copy queued objects until the queue is empty.
    ///
    /// A missing object (the resolver reports [`Error::ObjectNotFound`]) is
    /// replaced by a null object under its already-allocated output number so
    /// that no reference in the output dangles. Any other resolver error is
    /// structural corruption and aborts the flush.
    pub fn flush(&mut self, writer: &mut ObjectWriter, serializer: &ObjectSerializer) -> Result<()> {
        let source = self.source;
        while let Some(source_number) = self.queue.pop() {
            // Entry points reach here without a reservation; references made
            // during earlier copies already hold one.
            let output_number = match self.map.get(&source_number).copied() {
                Some(n) => n,
                None => {
                    let n = writer.reserve();
                    self.map.insert(source_number, n);
                    n
                },
            };

            let object = match self.resolver.resolve(source_number) {
                Ok(object) => object,
                Err(Error::ObjectNotFound(_)) => {
                    log::warn!(
                        "{}: object {} not found, writing null placeholder",
                        source,
                        source_number
                    );
                    Object::Null
                },
                Err(err) => return Err(err),
            };

            let map = &mut *self.map;
            let queue = &mut *self.queue;
            let body = serializer.serialize_mapped(&object, &mut |r: ObjectRef| {
                let mapped = match map.get(&r.id).copied() {
                    Some(n) => n,
                    None => {
                        let n = writer.reserve();
                        map.insert(r.id, n);
                        n
                    },
                };
                if queue.enqueue(r.id) {
                    log::trace!("{}: discovered object {}", source, r.id);
                }
                Ok(ObjectRef::new(mapped, 0))
            })?;

            writer.begin_reserved_object(output_number)?;
            writer.write_raw(&body);
            writer.end_object()?;
            log::debug!("{}: copied object {} as {}", source, source_number, output_number);
        }
        Ok(())
    }
}
