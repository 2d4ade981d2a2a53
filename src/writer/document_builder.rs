//! High-level document builder.
//!
//! Wraps the lower-level pieces into a two-phase workflow: an additive
//! authoring phase (pages, text, bookmarks, imported-page placements) followed
//! by a strictly ordered finalize in [`DocumentBuilder::build`]:
//!
//! ```text
//! header
//!   -> page content streams + page dictionaries
//!   -> outline entries + outline root
//!   -> per-source object graph copy
//!   -> imported page containers
//!   -> fonts, shared resources, pages root, info, catalog
//! xref + trailer
//! ```
//!
//! The shared resources dictionary and the pages root are referenced by every
//! page but depend on objects written later, so their numbers are reserved up
//! front and redeemed at the end.

use crate::error::Result;
use crate::import::{PageImporter, Placement, TemplateId};
use crate::object::{Object, ObjectRef};
use crate::source::{SourceId, SourceResolver};
use crate::writer::content_stream::ContentStreamBuilder;
use crate::writer::object_writer::ObjectWriter;
use crate::writer::outline::OutlineBuilder;
use crate::writer::serializer::ObjectSerializer;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

/// Configuration for document generation.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to compress fresh content streams
    pub compress: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: Some("pdf_compose".to_string()),
            compress: false,
        }
    }
}

impl WriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Internal page data.
struct PageData {
    width: f64,
    height: f64,
    content: ContentStreamBuilder,
}

/// A page being authored.
pub struct PageHandle<'a> {
    builder: &'a mut DocumentBuilder,
    page_index: usize,
}

impl<'a> PageHandle<'a> {
    /// Add text to the page.
    pub fn add_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font_name: &str,
        font_size: f64,
    ) -> &mut Self {
        self.builder.fonts.insert(font_name.to_string());
        let page = &mut self.builder.pages[self.page_index];
        page.content
            .begin_text()
            .set_font(&resource_font_name(font_name), font_size)
            .text(text, x, y);
        self
    }

    /// Add a bookmark pointing at this page.
    pub fn bookmark(&mut self, text: &str, level: usize, y: f64) -> &mut Self {
        self.builder.outline.add(text, level, y, self.page_index);
        self
    }

    /// Draw an imported page template on this page.
    ///
    /// Sizing follows the aspect-ratio rule of
    /// [`PageImporter::placement`]; with `adjust_page_size` the page itself
    /// takes on the resolved dimensions.
    pub fn place_template(
        &mut self,
        template: TemplateId,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
        adjust_page_size: bool,
    ) -> Result<Placement> {
        let placement = self.builder.importer.placement(template, width, height)?;
        let (natural_w, natural_h) = {
            let page = self.builder.importer.page(template)?;
            (page.natural_width(), page.natural_height())
        };

        let page = &mut self.builder.pages[self.page_index];
        if adjust_page_size {
            page.width = placement.width;
            page.height = placement.height;
        }

        let scale_x = if natural_w > 0.0 {
            placement.width / natural_w
        } else {
            1.0
        };
        let scale_y = if natural_h > 0.0 {
            placement.height / natural_h
        } else {
            1.0
        };
        page.content
            .paint_template(&template.resource_name(), x, y, scale_x, scale_y);
        Ok(placement)
    }

    /// Finish authoring this page.
    pub fn finish(&mut self) {
        self.builder.pages[self.page_index].content.end_text();
    }
}

/// Document builder assembling fresh and imported content.
pub struct DocumentBuilder {
    config: WriterConfig,
    pages: Vec<PageData>,
    outline: OutlineBuilder,
    importer: PageImporter,
    /// Base fonts used by fresh text, written as Type1 objects at finalize
    fonts: BTreeSet<String>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Create a builder with default config.
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    /// Create a builder with custom config.
    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            outline: OutlineBuilder::new(),
            importer: PageImporter::new(),
            fonts: BTreeSet::new(),
        }
    }

    /// Add a page with the given dimensions in points.
    pub fn add_page(&mut self, width: f64, height: f64) -> PageHandle<'_> {
        let page_index = self.pages.len();
        self.pages.push(PageData {
            width,
            height,
            content: ContentStreamBuilder::new(),
        });
        PageHandle {
            builder: self,
            page_index,
        }
    }

    /// Add a US Letter sized page (8.5" x 11").
    pub fn add_letter_page(&mut self) -> PageHandle<'_> {
        self.add_page(612.0, 792.0)
    }

    /// Add an A4 sized page (210mm x 297mm).
    pub fn add_a4_page(&mut self) -> PageHandle<'_> {
        self.add_page(595.0, 842.0)
    }

    /// Add a bookmark pointing at the current (last added) page.
    pub fn bookmark(&mut self, text: &str, level: usize, y: f64) -> &mut Self {
        let page = self.pages.len().saturating_sub(1);
        self.outline.add(text, level, y, page);
        self
    }

    /// Register a source document reader.
    pub fn add_source(&mut self, resolver: Box<dyn SourceResolver>) -> SourceId {
        self.importer.add_source(resolver)
    }

    /// Import a page of a registered source as a reusable template.
    pub fn import_page(&mut self, source: SourceId, page_ref: ObjectRef) -> Result<TemplateId> {
        self.importer.import_page(source, page_ref)
    }

    /// Resolve the size a placement would use, without drawing anything.
    pub fn template_size(
        &self,
        template: TemplateId,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Placement> {
        self.importer.placement(template, width, height)
    }

    /// Build the complete document.
    pub fn build(mut self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::compact();
        let mut writer = ObjectWriter::new(&self.config.version);

        // Referenced by every page, written after the objects they collect.
        let pages_root = writer.reserve();
        let resources = writer.reserve();

        // Fresh pages: content stream, then page dictionary.
        let mut page_numbers: Vec<u32> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let raw = page.content.build()?;
            let (data, compressed) = if self.config.compress {
                match compress_data(&raw) {
                    Ok(compressed) => (compressed, true),
                    Err(_) => (raw, false),
                }
            } else {
                (raw, false)
            };

            let mut stream_dict = HashMap::new();
            stream_dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
            if compressed {
                stream_dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            }
            let content_number = writer.write_object(
                &serializer,
                &Object::Stream {
                    dict: stream_dict,
                    data: bytes::Bytes::from(data),
                },
            )?;

            let page_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", ObjectSerializer::reference(pages_root, 0)),
                ("MediaBox", ObjectSerializer::rect(0.0, 0.0, page.width, page.height)),
                ("Contents", ObjectSerializer::reference(content_number, 0)),
                ("Resources", ObjectSerializer::reference(resources, 0)),
            ]);
            page_numbers.push(writer.write_object(&serializer, &page_obj)?);
        }

        // Outline objects come before everything that could reference them.
        let outline_root = self.outline.write(&mut writer, &serializer, &page_numbers)?;

        // Drain each source's copy queue, then write the containers that
        // reference the copied content.
        self.importer.flush_all(&mut writer, &serializer)?;
        let xobjects = self.importer.write_containers(&mut writer, &serializer)?;

        // Font objects for fresh text.
        let mut font_entries: Vec<(String, ObjectRef)> = Vec::new();
        for name in &self.fonts {
            let font_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Font")),
                ("Subtype", ObjectSerializer::name("Type1")),
                ("BaseFont", ObjectSerializer::name(name)),
                ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
            ]);
            let number = writer.write_object(&serializer, &font_obj)?;
            font_entries.push((resource_font_name(name), ObjectRef::new(number, 0)));
        }

        // Shared resources dictionary under its reserved number.
        let mut resources_dict: HashMap<String, Object> = HashMap::new();
        resources_dict.insert(
            "ProcSet".to_string(),
            Object::Array(vec![
                Object::Name("PDF".to_string()),
                Object::Name("Text".to_string()),
            ]),
        );
        if !font_entries.is_empty() {
            let fonts: HashMap<String, Object> = font_entries
                .into_iter()
                .map(|(name, r)| (name, Object::Reference(r)))
                .collect();
            resources_dict.insert("Font".to_string(), Object::Dictionary(fonts));
        }
        if !xobjects.is_empty() {
            let xobjects: HashMap<String, Object> = xobjects
                .into_iter()
                .map(|(name, r)| (name, Object::Reference(r)))
                .collect();
            resources_dict.insert("XObject".to_string(), Object::Dictionary(xobjects));
        }
        writer.write_reserved_object(&serializer, resources, &Object::Dictionary(resources_dict))?;

        // Pages root under its reserved number.
        let kids: Vec<Object> = page_numbers
            .iter()
            .map(|n| ObjectSerializer::reference(*n, 0))
            .collect();
        let pages_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", ObjectSerializer::integer(self.pages.len() as i64)),
        ]);
        writer.write_reserved_object(&serializer, pages_root, &pages_obj)?;

        // Info dictionary.
        let mut info_entries = Vec::new();
        if let Some(title) = &self.config.title {
            info_entries.push(("Title", ObjectSerializer::string(title)));
        }
        if let Some(author) = &self.config.author {
            info_entries.push(("Author", ObjectSerializer::string(author)));
        }
        if let Some(subject) = &self.config.subject {
            info_entries.push(("Subject", ObjectSerializer::string(subject)));
        }
        if let Some(keywords) = &self.config.keywords {
            info_entries.push(("Keywords", ObjectSerializer::string(keywords)));
        }
        if let Some(creator) = &self.config.creator {
            info_entries.push(("Creator", ObjectSerializer::string(creator)));
        }
        let info = writer.write_object(&serializer, &ObjectSerializer::dict(info_entries))?;

        // Catalog last: it references the outline root and the pages root.
        let mut catalog = vec![
            ("Type", ObjectSerializer::name("Catalog")),
            ("Pages", ObjectSerializer::reference(pages_root, 0)),
        ];
        if let Some(root) = outline_root {
            catalog.push(("Outlines", Object::Reference(root)));
            catalog.push(("PageMode", ObjectSerializer::name("UseOutlines")));
        }
        let catalog = writer.write_object(&serializer, &ObjectSerializer::dict(catalog))?;

        writer.finish(ObjectRef::new(catalog, 0), Some(ObjectRef::new(info, 0)))
    }

    /// Build and write the document to a file.
    pub fn save(self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.build()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Resource dictionary key for a base font ("Helvetica-Bold" -> "HelveticaBold").
fn resource_font_name(font_name: &str) -> String {
    font_name.replace('-', "")
}
