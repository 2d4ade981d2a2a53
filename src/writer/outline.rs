//! Document outline (bookmarks) for the output document.
//!
//! Bookmarks arrive as a flat, level-annotated list in authoring order. At
//! write time a single forward pass links them into a doubly-linked hierarchy
//! (parent / first / last / prev / next) using a last-seen-per-level map, and
//! the entries are emitted in their original order followed by the outline
//! root (PDF spec Section 12.3.3).
//!
//! Cross-references between entries are resolved before anything is written:
//! the pass produces relative indices, and absolute object numbers are
//! computed against the writer's next number captured as the batch base. The
//! root's number is `base + entry_count`, which lets level-0 entries point at
//! it before it exists.

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::writer::object_writer::ObjectWriter;
use crate::writer::serializer::ObjectSerializer;
use std::collections::HashMap;

/// A single bookmark entry.
///
/// Link fields are relative indices into the entry list; the index one past
/// the last entry stands for the virtual root.
#[derive(Debug, Clone)]
pub struct BookmarkEntry {
    /// Display title
    pub text: String,
    /// Nesting depth, 0 = top level. May jump by more than one between
    /// consecutive entries.
    pub level: usize,
    /// Vertical anchor on the target page, in default user space
    pub y: f64,
    /// Target page index (0-based, authoring order)
    pub page: usize,
    parent: usize,
    first: Option<usize>,
    last: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Builder for the document outline.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    entries: Vec<BookmarkEntry>,
}

impl OutlineBuilder {
    /// Create an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bookmark. No linking happens here.
    pub fn add(&mut self, text: impl Into<String>, level: usize, y: f64, page: usize) {
        self.entries.push(BookmarkEntry {
            text: text.into(),
            level,
            y,
            page,
            parent: 0,
            first: None,
            last: None,
            prev: None,
            next: None,
        });
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no bookmarks were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded entries, linked only after [`write`](Self::write) ran.
    pub fn entries(&self) -> &[BookmarkEntry] {
        &self.entries
    }

    /// Single forward pass computing the hierarchy links.
    ///
    /// `last_seen[l]` is the index of the most recent entry at level `l`. An
    /// entry's parent is the last entry seen one level up; when no such entry
    /// exists (the caller skipped levels at the start) the entry attaches to
    /// the virtual root. The parent's `last` pointer is rewritten by every
    /// child, so for irregular level sequences the last write wins; this
    /// matches the long-standing behavior of flat bookmark emitters and is
    /// kept for source compatibility.
    fn link(&mut self) {
        let sentinel = self.entries.len();
        let mut last_seen: HashMap<usize, usize> = HashMap::new();
        let mut current_level = 0usize;

        for i in 0..self.entries.len() {
            let level = self.entries[i].level;

            if level > 0 {
                match last_seen.get(&(level - 1)).copied() {
                    Some(parent) => {
                        self.entries[i].parent = parent;
                        self.entries[parent].last = Some(i);
                        if level > current_level {
                            self.entries[parent].first = Some(i);
                        }
                    },
                    None => {
                        self.entries[i].parent = sentinel;
                    },
                }
            } else {
                self.entries[i].parent = sentinel;
            }

            if level <= current_level && i > 0 {
                if let Some(prev) = last_seen.get(&level).copied() {
                    self.entries[prev].next = Some(i);
                    self.entries[i].prev = Some(prev);
                }
            }

            last_seen.insert(level, i);
            current_level = level;
        }
    }

    /// Link the entries and write them plus the outline root.
    ///
    /// `page_objects[page_index]` is the output object number of each page.
    /// Returns the root's reference, or `None` when no bookmarks were added
    /// (in which case nothing is emitted at all).
    pub fn write(
        &mut self,
        writer: &mut ObjectWriter,
        serializer: &ObjectSerializer,
        page_objects: &[u32],
    ) -> Result<Option<ObjectRef>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        self.link();

        let base = writer.next_object_number();
        let count = self.entries.len();
        let root_number = base + count as u32;
        log::debug!("writing {} outline entries at objects {}..{}", count, base, root_number);

        let sentinel = count;
        for i in 0..count {
            let entry = &self.entries[i];
            let page_object = page_objects.get(entry.page).copied().ok_or_else(|| {
                Error::InvalidPdf(format!("bookmark targets unknown page {}", entry.page))
            })?;

            let parent_number = if entry.parent == sentinel {
                root_number
            } else {
                base + entry.parent as u32
            };

            let mut dict = vec![
                ("Title", Object::String(encode_text(&entry.text))),
                ("Parent", ObjectSerializer::reference(parent_number, 0)),
                ("Count", Object::Integer(0)),
            ];
            if let Some(prev) = entry.prev {
                dict.push(("Prev", ObjectSerializer::reference(base + prev as u32, 0)));
            }
            if let Some(next) = entry.next {
                dict.push(("Next", ObjectSerializer::reference(base + next as u32, 0)));
            }
            if let Some(first) = entry.first {
                dict.push(("First", ObjectSerializer::reference(base + first as u32, 0)));
            }
            if let Some(last) = entry.last {
                dict.push(("Last", ObjectSerializer::reference(base + last as u32, 0)));
            }
            // Fixed anchor: left edge, explicit y, unchanged zoom
            dict.push((
                "Dest",
                Object::Array(vec![
                    ObjectSerializer::reference(page_object, 0),
                    Object::Name("XYZ".to_string()),
                    Object::Integer(0),
                    Object::Real(round2(entry.y)),
                    Object::Null,
                ]),
            ));

            let number = writer.begin_object()?;
            debug_assert_eq!(number, base + i as u32);
            let body = serializer.serialize(&ObjectSerializer::dict(dict));
            writer.write_raw(&body);
            writer.end_object()?;
        }

        // Root references the first and last top-level entries. The last one
        // is whatever the link pass saw at level 0 most recently.
        let first_top = self
            .entries
            .iter()
            .position(|e| e.level == 0)
            .unwrap_or(0);
        let last_top = self
            .entries
            .iter()
            .rposition(|e| e.level == 0)
            .unwrap_or(first_top);

        let root = writer.begin_object()?;
        debug_assert_eq!(root, root_number);
        let root_dict = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Outlines")),
            ("First", ObjectSerializer::reference(base + first_top as u32, 0)),
            ("Last", ObjectSerializer::reference(base + last_top as u32, 0)),
        ]);
        writer.write_raw(&serializer.serialize(&root_dict));
        writer.end_object()?;

        Ok(Some(ObjectRef::new(root_number, 0)))
    }
}

impl BookmarkEntry {
    /// Parent index after linking; `entries.len()` stands for the root.
    pub fn parent_index(&self) -> usize {
        self.parent
    }

    /// First child index after linking.
    pub fn first_child(&self) -> Option<usize> {
        self.first
    }

    /// Last child index after linking.
    pub fn last_child(&self) -> Option<usize> {
        self.last
    }

    /// Previous sibling index after linking.
    pub fn prev_sibling(&self) -> Option<usize> {
        self.prev
    }

    /// Next sibling index after linking.
    pub fn next_sibling(&self) -> Option<usize> {
        self.next
    }
}

/// Round a coordinate to two decimal places for destination output.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Encode a bookmark title as a PDF text string.
///
/// ASCII passes through unchanged; anything else becomes UTF-16BE with a BOM.
fn encode_text(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut out = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(levels: &[usize]) -> OutlineBuilder {
        let mut outline = OutlineBuilder::new();
        for (i, &level) in levels.iter().enumerate() {
            outline.add(format!("entry {}", i), level, 700.0, 0);
        }
        outline.link();
        outline
    }

    #[test]
    fn test_link_parent_is_one_level_up() {
        let outline = linked(&[0, 1, 1, 2, 1, 0]);
        let entries = outline.entries();
        let sentinel = entries.len();

        for (i, entry) in entries.iter().enumerate() {
            if entry.level == 0 {
                assert_eq!(entry.parent_index(), sentinel, "entry {}", i);
            } else {
                // Scanning backward, the parent is the nearest entry exactly
                // one level up.
                let expected = (0..i)
                    .rev()
                    .find(|&j| entries[j].level == entry.level - 1)
                    .unwrap();
                assert_eq!(entry.parent_index(), expected, "entry {}", i);
            }
        }
    }

    #[test]
    fn test_link_siblings_and_children() {
        let outline = linked(&[0, 1, 1, 2, 1, 0]);
        let entries = outline.entries();

        // entry 0 gains children 1, 2, 4; last write wins
        assert_eq!(entries[0].first_child(), Some(1));
        assert_eq!(entries[0].last_child(), Some(4));
        // sibling chain at level 1
        assert_eq!(entries[1].next_sibling(), Some(2));
        assert_eq!(entries[2].prev_sibling(), Some(1));
        assert_eq!(entries[2].next_sibling(), Some(4));
        assert_eq!(entries[4].prev_sibling(), Some(2));
        // nested child
        assert_eq!(entries[2].first_child(), Some(3));
        assert_eq!(entries[2].last_child(), Some(3));
        // top-level chain
        assert_eq!(entries[0].next_sibling(), Some(5));
        assert_eq!(entries[5].prev_sibling(), Some(0));
    }

    #[test]
    fn test_link_level_jump_falls_back_to_root() {
        // First entry already nested: nothing one level up was ever seen.
        let outline = linked(&[2, 0]);
        let entries = outline.entries();
        assert_eq!(entries[0].parent_index(), 2);
        assert_eq!(entries[1].parent_index(), 2);
    }

    #[test]
    fn test_write_empty_outline_is_noop() {
        let mut outline = OutlineBuilder::new();
        let mut writer = ObjectWriter::new("1.7");
        let serializer = ObjectSerializer::compact();
        let root = outline.write(&mut writer, &serializer, &[]).unwrap();
        assert!(root.is_none());
        assert_eq!(writer.object_count(), 0);
    }

    #[test]
    fn test_write_absolute_numbers() {
        let mut outline = OutlineBuilder::new();
        outline.add("Chapter 1", 0, 720.0, 0);
        outline.add("Section 1.1", 1, 400.0, 0);
        outline.add("Chapter 2", 0, 720.0, 1);

        let mut writer = ObjectWriter::new("1.7");
        let serializer = ObjectSerializer::compact();
        let root = outline
            .write(&mut writer, &serializer, &[90, 91])
            .unwrap()
            .unwrap();

        // base 1, three entries, root at base + 3
        assert_eq!(root.id, 4);

        let bytes = writer.finish(root, None).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();

        // entry 0: parented to the root, next sibling entry 2
        assert!(text.contains("(Chapter 1)"));
        assert!(text.contains("/Parent 4 0 R"));
        assert!(text.contains("/Next 3 0 R"));
        // entry 1 parented to entry 0
        assert!(text.contains("/Parent 1 0 R"));
        // destinations target the supplied page objects
        assert!(text.contains("[90 0 R /XYZ 0 720 null]"));
        assert!(text.contains("[91 0 R /XYZ 0 720 null]"));
        assert!(text.contains("[90 0 R /XYZ 0 400 null]"));
        // leaf-style count
        assert!(text.contains("/Count 0"));
        // root
        assert!(text.contains("/Type /Outlines"));
        assert!(text.contains("/First 1 0 R"));
        assert!(text.contains("/Last 3 0 R"));
    }

    #[test]
    fn test_root_last_is_last_level0_added() {
        // Irregular: ends on a nested entry; last level-0 is entry 2.
        let mut outline = linked(&[0, 1, 0, 1, 2]);
        let mut writer = ObjectWriter::new("1.7");
        let serializer = ObjectSerializer::compact();
        let root = outline
            .write(&mut writer, &serializer, &[50])
            .unwrap()
            .unwrap();
        let bytes = writer.finish(root, None).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();

        // base 1: first level-0 is entry 0 -> object 1, last is entry 2 -> object 3
        assert!(text.contains("/First 1 0 R/Last 3 0 R") || text.contains("/First 1 0 R /Last 3 0 R"));
    }

    #[test]
    fn test_dest_rounding() {
        let mut outline = OutlineBuilder::new();
        outline.add("t", 0, 123.456789, 0);
        let mut writer = ObjectWriter::new("1.7");
        let serializer = ObjectSerializer::compact();
        let root = outline.write(&mut writer, &serializer, &[9]).unwrap().unwrap();
        let bytes = writer.finish(root, None).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        assert!(text.contains("/XYZ 0 123.46 null"));
    }

    #[test]
    fn test_unknown_page_is_error() {
        let mut outline = OutlineBuilder::new();
        outline.add("t", 0, 0.0, 7);
        let mut writer = ObjectWriter::new("1.7");
        let serializer = ObjectSerializer::compact();
        assert!(outline.write(&mut writer, &serializer, &[1]).is_err());
    }

    #[test]
    fn test_encode_text_utf16() {
        assert_eq!(encode_text("Plain"), b"Plain".to_vec());
        let encoded = encode_text("Résumé");
        assert_eq!(&encoded[..2], &[0xFE, 0xFF]);
        assert_eq!(&encoded[2..4], &[0x00, b'R']);
    }
}
