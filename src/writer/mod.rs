//! Output document writing.
//!
//! ## Architecture
//!
//! ```text
//! [DocumentBuilder] (authoring + finalize ordering)
//!     ↓
//! [OutlineBuilder] [GraphCopier/PageImporter] [ContentStreamBuilder]
//!     ↓
//! [ObjectWriter] (object numbering, xref, trailer)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ```ignore
//! use pdf_compose::writer::DocumentBuilder;
//!
//! let mut builder = DocumentBuilder::new();
//! builder
//!     .add_letter_page()
//!     .add_text("Hello, World!", 72.0, 720.0, "Helvetica", 12.0)
//!     .bookmark("Greeting", 0, 720.0)
//!     .finish();
//! let bytes = builder.build()?;
//! ```

mod content_stream;
mod document_builder;
mod object_writer;
mod outline;
mod serializer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use document_builder::{DocumentBuilder, PageHandle, WriterConfig};
pub use object_writer::ObjectWriter;
pub use outline::{BookmarkEntry, OutlineBuilder};
pub use serializer::ObjectSerializer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _serializer = ObjectSerializer::new();
        let _builder = ContentStreamBuilder::new();
        let _outline = OutlineBuilder::new();
    }
}
