//! # pdf_compose
//!
//! Compose PDF documents from freshly drawn content and pages imported from
//! existing PDFs, with navigable outlines.
//!
//! ## Core Features
//!
//! - **Page import**: register a page of an already-parsed source document as
//!   a reusable template; the transitive closure of objects it depends on is
//!   copied into the output exactly once, renumbered on the fly, with null
//!   placeholders for objects missing from the source.
//! - **Outlines**: flat, level-annotated bookmarks linked into a hierarchical
//!   outline tree in a single pass and serialized against the output's object
//!   numbering.
//! - **Fresh content**: pages with standard-font text, optional FlateDecode
//!   compression, document metadata.
//!
//! ## Architecture
//!
//! Parsing of source documents stays behind the [`source::SourceResolver`]
//! trait; any reader that hands back decoded objects by number can feed the
//! importer. Output object numbers are owned by a single sequential writer
//! and handed out through a reserve/allocate protocol, which is what lets
//! bookmarks and copied objects reference each other before they exist.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_compose::writer::DocumentBuilder;
//! use pdf_compose::ObjectRef;
//!
//! # fn main() -> pdf_compose::Result<()> {
//! let mut builder = DocumentBuilder::new();
//! let source = builder.add_source(Box::new(parse_somehow("template.pdf")));
//! let template = builder.import_page(source, ObjectRef::new(3, 0))?;
//!
//! let mut page = builder.add_letter_page();
//! page.place_template(template, 0.0, 0.0, None, None, true)?;
//! page.bookmark("Imported cover", 0, 792.0);
//! page.finish();
//!
//! builder.save("out.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod object;

// Source document access
pub mod source;

// Imported page registry and object graph copy
pub mod import;

// Output writing
pub mod writer;

// Re-exports
pub use error::{Error, Result};
pub use import::{Orientation, PageImporter, Placement, TemplateId};
pub use object::{Object, ObjectRef};
pub use source::{MemorySource, SourceId, SourceResolver};
pub use writer::{DocumentBuilder, WriterConfig};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
