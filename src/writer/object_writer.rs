//! Sequential object emission for the output document.
//!
//! [`ObjectWriter`] is the sole authority over output object numbers. Numbers
//! move through a two-step protocol: `reserve` hands a number to a dependent
//! that must refer to an object before it exists (forward references,
//! batch-relative offsets), and `begin_reserved_object` redeems the
//! reservation when the object is actually emitted. `begin_object` collapses
//! both steps for the common emit-now case. Every number must be begun exactly
//! once before the trailer is written.

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::writer::serializer::ObjectSerializer;
use std::collections::HashMap;
use std::io::Write;

/// Buffered writer assembling the output document body, xref table and
/// trailer.
pub struct ObjectWriter {
    buffer: Vec<u8>,
    /// Next object number that has not been reserved or allocated.
    next_number: u32,
    /// Byte offset of each begun object, keyed by object number.
    offsets: HashMap<u32, usize>,
    /// Object currently being emitted, if any.
    open: Option<u32>,
}

impl ObjectWriter {
    /// Create a writer and emit the document header.
    pub fn new(version: &str) -> Self {
        let mut buffer = Vec::new();
        writeln!(buffer, "%PDF-{}", version).unwrap();
        // Binary marker (recommended for binary content)
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            next_number: 1,
            offsets: HashMap::new(),
            open: None,
        }
    }

    /// Peek at the number the next allocation will return.
    ///
    /// Batch emitters capture this as their base and compute member numbers
    /// as `base + relative_index` before anything is written.
    pub fn next_object_number(&self) -> u32 {
        self.next_number
    }

    /// Reserve the next object number without emitting anything.
    pub fn reserve(&mut self) -> u32 {
        let number = self.next_number;
        self.next_number += 1;
        number
    }

    /// Reserve-and-begin the next object. Returns its number.
    pub fn begin_object(&mut self) -> Result<u32> {
        let number = self.reserve();
        self.begin_reserved_object(number)?;
        Ok(number)
    }

    /// Begin emitting an object under a previously reserved number.
    pub fn begin_reserved_object(&mut self, number: u32) -> Result<()> {
        if let Some(open) = self.open {
            return Err(Error::InvalidPdf(format!(
                "object {} begun while object {} is still open",
                number, open
            )));
        }
        if number == 0 || number >= self.next_number {
            return Err(Error::InvalidPdf(format!("object number {} was never reserved", number)));
        }
        if self.offsets.contains_key(&number) {
            return Err(Error::InvalidPdf(format!("object {} emitted twice", number)));
        }
        self.offsets.insert(number, self.buffer.len());
        writeln!(self.buffer, "{} 0 obj", number)?;
        self.open = Some(number);
        Ok(())
    }

    /// Append raw bytes to the currently open object's body.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Close the currently open object.
    pub fn end_object(&mut self) -> Result<()> {
        if self.open.take().is_none() {
            return Err(Error::InvalidPdf("endobj without open object".to_string()));
        }
        self.buffer.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    /// Emit `obj` as the next object. Returns its number.
    pub fn write_object(&mut self, serializer: &ObjectSerializer, obj: &Object) -> Result<u32> {
        let number = self.begin_object()?;
        let body = serializer.serialize(obj);
        self.write_raw(&body);
        self.end_object()?;
        Ok(number)
    }

    /// Emit `obj` under a previously reserved number.
    pub fn write_reserved_object(
        &mut self,
        serializer: &ObjectSerializer,
        number: u32,
        obj: &Object,
    ) -> Result<()> {
        self.begin_reserved_object(number)?;
        let body = serializer.serialize(obj);
        self.write_raw(&body);
        self.end_object()
    }

    /// Current length of the output buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written (never true: the header is emitted on
    /// construction).
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of objects allocated so far.
    pub fn object_count(&self) -> u32 {
        self.next_number - 1
    }

    /// Write the xref table and trailer and return the finished document.
    ///
    /// Fails if an object is still open or a reserved number was never
    /// emitted: a gap in the numbering would leave dangling references in the
    /// output.
    pub fn finish(mut self, root: ObjectRef, info: Option<ObjectRef>) -> Result<Vec<u8>> {
        if let Some(open) = self.open {
            return Err(Error::InvalidPdf(format!("object {} still open at finish", open)));
        }
        for number in 1..self.next_number {
            if !self.offsets.contains_key(&number) {
                return Err(Error::InvalidPdf(format!(
                    "reserved object {} was never written",
                    number
                )));
            }
        }

        let xref_start = self.buffer.len();
        writeln!(self.buffer, "xref")?;
        writeln!(self.buffer, "0 {}", self.next_number)?;

        // Object 0 is always free
        writeln!(self.buffer, "0000000000 65535 f ")?;

        let mut entries: Vec<(u32, usize)> = self.offsets.iter().map(|(n, o)| (*n, *o)).collect();
        entries.sort_by_key(|(n, _)| *n);
        for (_, offset) in &entries {
            writeln!(self.buffer, "{:010} 00000 n ", offset)?;
        }

        let serializer = ObjectSerializer::compact();
        let mut trailer = vec![
            ("Size", ObjectSerializer::integer(self.next_number as i64)),
            ("Root", Object::Reference(root)),
        ];
        if let Some(info) = info {
            trailer.push(("Info", Object::Reference(info)));
        }
        writeln!(self.buffer, "trailer")?;
        self.buffer
            .extend_from_slice(&serializer.serialize(&ObjectSerializer::dict(trailer)));
        writeln!(self.buffer)?;
        writeln!(self.buffer, "startxref")?;
        writeln!(self.buffer, "{}", xref_start)?;
        write!(self.buffer, "%%EOF")?;

        Ok(self.buffer)
    }
}
