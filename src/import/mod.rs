//! Imported page registry.
//!
//! Pages of already-parsed source documents are registered here as reusable
//! drawable templates. Registration captures a descriptor (content, resources,
//! page box) and seeds the source's pending copy queue with the page's
//! resource-closure entry points; the actual transitive copy happens later in
//! [`copier`] when the output is finalized.

mod copier;

pub use copier::GraphCopier;

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::source::{SourceId, SourceResolver};
use crate::writer::{ObjectSerializer, ObjectWriter};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Default page box when a source page carries no MediaBox (US Letter).
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Opaque identifier of a registered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub(crate) usize);

impl TemplateId {
    /// The XObject resource name this template is drawn under.
    pub fn resource_name(&self) -> String {
        format!("TPL{}", self.0)
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TPL{}", self.0)
    }
}

/// Page orientation derived from a placement's resolved size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Height >= width
    Portrait,
    /// Width > height
    Landscape,
}

/// Resolved size of one template placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Resolved width in points
    pub width: f64,
    /// Resolved height in points
    pub height: f64,
    /// Orientation of the resolved size
    pub orientation: Orientation,
}

/// Descriptor of a source page registered for reuse.
#[derive(Debug, Clone)]
pub struct ImportedPage {
    /// Source the page came from
    pub source: SourceId,
    /// Raw `/Contents` value: a single reference or an array of references
    pub contents: Object,
    /// Raw `/Resources` value: a reference or a direct dictionary
    pub resources: Object,
    /// Page box `[llx, lly, urx, ury]`
    pub media_box: [f64; 4],
    /// Output object number of the container, assigned when it is written
    pub object_number: Option<u32>,
}

impl ImportedPage {
    /// Natural width of the page box.
    pub fn natural_width(&self) -> f64 {
        self.media_box[2] - self.media_box[0]
    }

    /// Natural height of the page box.
    pub fn natural_height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }
}

/// Set-backed stack of source object numbers awaiting copy.
///
/// A number enters `seen` the moment it is enqueued and never leaves, so each
/// object is scheduled at most once over the queue's whole lifetime. That is
/// what terminates cyclic reference chains.
#[derive(Debug, Default)]
pub(crate) struct PendingCopyQueue {
    stack: Vec<u32>,
    seen: HashSet<u32>,
}

impl PendingCopyQueue {
    /// Schedule `object_number` unless it was ever scheduled before.
    /// Returns whether it was newly added.
    pub(crate) fn enqueue(&mut self, object_number: u32) -> bool {
        if self.seen.insert(object_number) {
            self.stack.push(object_number);
            true
        } else {
            false
        }
    }

    /// Take the next number to copy.
    pub(crate) fn pop(&mut self) -> Option<u32> {
        self.stack.pop()
    }

    /// Whether nothing is pending.
    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// One registered source reader with its copy state.
struct SourceState {
    resolver: Box<dyn SourceResolver>,
    queue: PendingCopyQueue,
    /// Source object number -> output object number
    map: HashMap<u32, u32>,
}

/// Registry of source readers and imported page templates.
pub struct PageImporter {
    sources: Vec<SourceState>,
    pages: IndexMap<usize, ImportedPage>,
}

impl Default for PageImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageImporter {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            pages: IndexMap::new(),
        }
    }

    /// Register a source reader and return its id.
    pub fn add_source(&mut self, resolver: Box<dyn SourceResolver>) -> SourceId {
        self.sources.push(SourceState {
            resolver,
            queue: PendingCopyQueue::default(),
            map: HashMap::new(),
        });
        SourceId(self.sources.len() - 1)
    }

    /// Register `page_ref` of `source` as a template.
    ///
    /// Resolves the page object, captures its descriptor, and seeds the
    /// source's copy queue with every reference reachable in the direct
    /// values of `/Contents` and `/Resources`. Traversal beyond those entry
    /// points is deferred to the copier.
    pub fn import_page(&mut self, source: SourceId, page_ref: ObjectRef) -> Result<TemplateId> {
        let state = self
            .sources
            .get_mut(source.0)
            .ok_or(Error::UnknownSource(source.0))?;

        let page = state.resolver.resolve(page_ref.id)?;
        let dict = match page.as_dict() {
            Some(d) => d,
            None => {
                return Err(Error::InvalidObjectType {
                    expected: "Dictionary".to_string(),
                    found: page.type_name().to_string(),
                })
            },
        };

        let contents = dict.get("Contents").cloned().unwrap_or(Object::Null);
        let resources = dict
            .get("Resources")
            .cloned()
            .unwrap_or_else(|| Object::Dictionary(HashMap::new()));
        let media_box = resolve_media_box(dict.get("MediaBox"), state.resolver.as_mut())?;

        let mut entry_points = Vec::new();
        contents.collect_refs(&mut entry_points);
        resources.collect_refs(&mut entry_points);
        for r in &entry_points {
            state.queue.enqueue(r.id);
        }

        let id = TemplateId(self.pages.len());
        log::debug!(
            "imported page {} of {} as {} ({} entry points)",
            page_ref,
            source,
            id,
            entry_points.len()
        );
        self.pages.insert(
            id.0,
            ImportedPage {
                source,
                contents,
                resources,
                media_box,
                object_number: None,
            },
        );
        Ok(id)
    }

    /// Look up a registered template.
    pub fn page(&self, template: TemplateId) -> Result<&ImportedPage> {
        self.pages
            .get(&template.0)
            .ok_or(Error::UnknownTemplate(template.0))
    }

    /// Number of registered templates.
    pub fn template_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any template was registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Resolve the drawn size of a placement.
    ///
    /// With neither dimension given the natural size is used; with exactly
    /// one, the other follows from the natural aspect ratio; with both, the
    /// given size wins and the aspect ratio is not preserved.
    pub fn placement(
        &self,
        template: TemplateId,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Placement> {
        let page = self.page(template)?;
        let natural_w = page.natural_width();
        let natural_h = page.natural_height();

        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                if natural_w == 0.0 {
                    return Err(Error::UnresolvablePageSize(template.0));
                }
                (w, w * natural_h / natural_w)
            },
            (None, Some(h)) => {
                if natural_h == 0.0 {
                    return Err(Error::UnresolvablePageSize(template.0));
                }
                (h * natural_w / natural_h, h)
            },
            (None, None) => {
                if natural_w == 0.0 && natural_h == 0.0 {
                    return Err(Error::UnresolvablePageSize(template.0));
                }
                (natural_w, natural_h)
            },
        };

        let orientation = if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Ok(Placement {
            width,
            height,
            orientation,
        })
    }

    /// Drain every source's pending copy queue into the output.
    ///
    /// Sources are processed in registration order; each queue is emptied
    /// completely before the next source begins.
    pub fn flush_all(
        &mut self,
        writer: &mut ObjectWriter,
        serializer: &ObjectSerializer,
    ) -> Result<()> {
        for (index, state) in self.sources.iter_mut().enumerate() {
            let mut copier = GraphCopier {
                source: SourceId(index),
                resolver: state.resolver.as_mut(),
                queue: &mut state.queue,
                map: &mut state.map,
            };
            copier.flush(writer, serializer)?;
        }
        Ok(())
    }

    /// Write the container object of every imported page.
    ///
    /// Must run after [`flush_all`](Self::flush_all): the containers refer to
    /// the copied content and resources through the per-source mapping, and a
    /// mapping miss at this point means the closure was not copied.
    ///
    /// Returns `(resource_name, container_ref)` pairs for the shared resource
    /// dictionary.
    pub fn write_containers(
        &mut self,
        writer: &mut ObjectWriter,
        serializer: &ObjectSerializer,
    ) -> Result<Vec<(String, ObjectRef)>> {
        let mut names = Vec::new();
        for (index, page) in self.pages.iter_mut() {
            let state = &self.sources[page.source.0];
            debug_assert!(state.queue.is_empty(), "containers written before copy flush");
            let [llx, lly, urx, ury] = page.media_box;

            let mut dict = vec![
                ("Type", ObjectSerializer::name("XObject")),
                ("Subtype", ObjectSerializer::name("Form")),
                ("FormType", ObjectSerializer::integer(1)),
                ("BBox", ObjectSerializer::rect(llx, lly, urx, ury)),
                ("Resources", page.resources.clone()),
            ];
            if llx != 0.0 || lly != 0.0 {
                dict.push((
                    "Matrix",
                    Object::Array(vec![
                        Object::Integer(1),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(1),
                        Object::Real(-llx),
                        Object::Real(-lly),
                    ]),
                ));
            }
            if !page.contents.is_null() {
                dict.push(("Contents", page.contents.clone()));
            }

            let body = serializer.serialize_mapped(&ObjectSerializer::dict(dict), &mut |r| {
                state
                    .map
                    .get(&r.id)
                    .map(|n| ObjectRef::new(*n, 0))
                    .ok_or_else(|| {
                        Error::InvalidPdf(format!(
                            "imported page references object {} that was never copied",
                            r.id
                        ))
                    })
            })?;

            let number = writer.begin_object()?;
            writer.write_raw(&body);
            writer.end_object()?;
            page.object_number = Some(number);
            names.push((TemplateId(*index).resource_name(), ObjectRef::new(number, 0)));
        }
        Ok(names)
    }
}

/// Resolve a page's MediaBox value, following at most one indirect hop.
fn resolve_media_box(
    value: Option<&Object>,
    resolver: &mut dyn SourceResolver,
) -> Result<[f64; 4]> {
    let value = match value {
        None => return Ok(DEFAULT_MEDIA_BOX),
        Some(v) => v,
    };
    let resolved;
    let value = match value.as_reference() {
        Some(r) => {
            resolved = resolver.resolve(r.id)?;
            &resolved
        },
        None => value,
    };
    let arr = value.as_array().ok_or_else(|| Error::InvalidObjectType {
        expected: "Array".to_string(),
        found: value.type_name().to_string(),
    })?;
    if arr.len() != 4 {
        return Err(Error::InvalidPdf(format!("MediaBox has {} elements", arr.len())));
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(arr) {
        *slot = item
            .as_number()
            .ok_or_else(|| Error::InvalidPdf("non-numeric MediaBox entry".to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn letter_page(contents: Object, resources: Object) -> Object {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), Object::Name("Page".to_string()));
        dict.insert("Contents".to_string(), contents);
        dict.insert("Resources".to_string(), resources);
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(50),
                Object::Integer(200),
            ]),
        );
        Object::Dictionary(dict)
    }

    fn importer_with_page() -> (PageImporter, TemplateId) {
        let source = MemorySource::new()
            .with(
                3,
                letter_page(
                    ObjectSerializer::reference(5, 0),
                    ObjectSerializer::dict(vec![("Font", ObjectSerializer::reference(7, 0))]),
                ),
            )
            .with(
                5,
                Object::Stream {
                    dict: HashMap::new(),
                    data: bytes::Bytes::from_static(b"BT ET"),
                },
            )
            .with(7, ObjectSerializer::dict(vec![]));

        let mut importer = PageImporter::new();
        let src = importer.add_source(Box::new(source));
        let tpl = importer.import_page(src, ObjectRef::new(3, 0)).unwrap();
        (importer, tpl)
    }

    #[test]
    fn test_import_page_captures_descriptor() {
        let (importer, tpl) = importer_with_page();
        let page = importer.page(tpl).unwrap();
        assert_eq!(page.natural_width(), 50.0);
        assert_eq!(page.natural_height(), 200.0);
        assert!(page.object_number.is_none());
    }

    #[test]
    fn test_placement_natural_size() {
        let (importer, tpl) = importer_with_page();
        let p = importer.placement(tpl, None, None).unwrap();
        assert_eq!((p.width, p.height), (50.0, 200.0));
        assert_eq!(p.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_placement_width_drives_height() {
        let (importer, tpl) = importer_with_page();
        let p = importer.placement(tpl, Some(100.0), None).unwrap();
        assert_eq!(p.height, 400.0);
    }

    #[test]
    fn test_placement_height_drives_width() {
        let (importer, tpl) = importer_with_page();
        let p = importer.placement(tpl, None, Some(100.0)).unwrap();
        assert_eq!(p.width, 25.0);
    }

    #[test]
    fn test_placement_both_given_ignores_ratio() {
        let (importer, tpl) = importer_with_page();
        let p = importer.placement(tpl, Some(300.0), Some(10.0)).unwrap();
        assert_eq!((p.width, p.height), (300.0, 10.0));
        assert_eq!(p.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_placement_unknown_template() {
        let (importer, _) = importer_with_page();
        match importer.placement(TemplateId(99), None, None) {
            Err(Error::UnknownTemplate(99)) => {},
            other => panic!("expected UnknownTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_placement_degenerate_natural_size() {
        let mut dict = HashMap::new();
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
            ]),
        );
        let source = MemorySource::new().with(1, Object::Dictionary(dict));
        let mut importer = PageImporter::new();
        let src = importer.add_source(Box::new(source));
        let tpl = importer.import_page(src, ObjectRef::new(1, 0)).unwrap();

        assert!(matches!(
            importer.placement(tpl, None, None),
            Err(Error::UnresolvablePageSize(_))
        ));
        assert!(matches!(
            importer.placement(tpl, Some(10.0), None),
            Err(Error::UnresolvablePageSize(_))
        ));
        // explicit size needs nothing from the page box
        assert!(importer.placement(tpl, Some(10.0), Some(20.0)).is_ok());
    }

    #[test]
    fn test_pending_queue_dedups_forever() {
        let mut queue = PendingCopyQueue::default();
        assert!(queue.enqueue(4));
        assert!(!queue.enqueue(4));
        assert_eq!(queue.pop(), Some(4));
        // once popped it may never come back
        assert!(!queue.enqueue(4));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_import_page_not_a_dictionary() {
        let source = MemorySource::new().with(1, Object::Integer(9));
        let mut importer = PageImporter::new();
        let src = importer.add_source(Box::new(source));
        assert!(matches!(
            importer.import_page(src, ObjectRef::new(1, 0)),
            Err(Error::InvalidObjectType { .. })
        ));
    }

    #[test]
    fn test_media_box_indirect() {
        let mut dict = HashMap::new();
        dict.insert("MediaBox".to_string(), ObjectSerializer::reference(9, 0));
        let source = MemorySource::new()
            .with(1, Object::Dictionary(dict))
            .with(
                9,
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(300.0),
                    Object::Real(150.0),
                ]),
            );
        let mut importer = PageImporter::new();
        let src = importer.add_source(Box::new(source));
        let tpl = importer.import_page(src, ObjectRef::new(1, 0)).unwrap();
        let page = importer.page(tpl).unwrap();
        assert_eq!(page.media_box, [0.0, 0.0, 300.0, 150.0]);
    }
}
