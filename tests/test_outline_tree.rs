//! Integration tests for outline tree linking and serialization.
//!
//! Builds documents with level-annotated bookmarks and verifies the linked
//! hierarchy the way a reader would see it: absolute Parent/Prev/Next/First/
//! Last references between the emitted outline objects.

use pdf_compose::writer::DocumentBuilder;

/// Extract the body of object `number` from the serialized document.
fn object_body(document: &str, number: u32) -> String {
    let start_marker = format!("\n{} 0 obj\n", number);
    let start = document
        .find(&start_marker)
        .unwrap_or_else(|| panic!("object {} not found", number));
    let rest = &document[start + start_marker.len()..];
    let end = rest.find("endobj").expect("unterminated object");
    rest[..end].to_string()
}

/// Build a document with two empty pages and the given bookmark levels. All
/// bookmarks target the current (second) page.
fn build_with_levels(levels: &[usize]) -> String {
    let mut builder = DocumentBuilder::new();
    builder.add_letter_page().finish();
    builder.add_letter_page().finish();

    for (i, &level) in levels.iter().enumerate() {
        builder.bookmark(&format!("entry {}", i), level, 700.0 - i as f64);
    }

    let bytes = builder.build().expect("build failed");
    String::from_utf8_lossy(&bytes).to_string()
}

// Object layout for two pages: 1 pages root (reserved), 2 resources
// (reserved), 3/5 content streams, 4/6 page dicts, then outline entries from
// 7, root after the entries.

#[test]
fn test_irregular_levels_link_like_the_flat_scan() {
    // levels [0, 1, 1, 2, 1, 0] -> entries at objects 7..=12, root 13
    let text = build_with_levels(&[0, 1, 1, 2, 1, 0]);

    let e0 = object_body(&text, 7);
    assert!(e0.contains("/Parent 13 0 R"), "e0 parents to root: {}", e0);
    assert!(e0.contains("/First 8 0 R"));
    assert!(e0.contains("/Last 11 0 R"));
    assert!(e0.contains("/Next 12 0 R"));
    assert!(!e0.contains("/Prev"));

    let e1 = object_body(&text, 8);
    assert!(e1.contains("/Parent 7 0 R"));
    assert!(e1.contains("/Next 9 0 R"));
    assert!(!e1.contains("/Prev"));

    let e2 = object_body(&text, 9);
    assert!(e2.contains("/Parent 7 0 R"));
    assert!(e2.contains("/Prev 8 0 R"));
    assert!(e2.contains("/Next 11 0 R"));
    assert!(e2.contains("/First 10 0 R"));
    assert!(e2.contains("/Last 10 0 R"));

    let e3 = object_body(&text, 10);
    assert!(e3.contains("/Parent 9 0 R"));
    assert!(!e3.contains("/First"));
    assert!(!e3.contains("/Next"));

    let e4 = object_body(&text, 11);
    assert!(e4.contains("/Parent 7 0 R"));
    assert!(e4.contains("/Prev 9 0 R"));

    let e5 = object_body(&text, 12);
    assert!(e5.contains("/Parent 13 0 R"));
    assert!(e5.contains("/Prev 7 0 R"));
}

#[test]
fn test_root_references_first_and_last_top_level() {
    let text = build_with_levels(&[0, 1, 1, 2, 1, 0]);
    let root = object_body(&text, 13);

    assert!(root.contains("/Type /Outlines"));
    assert!(root.contains("/First 7 0 R"));
    assert!(root.contains("/Last 12 0 R"));
}

#[test]
fn test_root_last_write_wins_on_malformed_levels() {
    // ends nested: the last level-0 entry is index 2 (object 9)
    let text = build_with_levels(&[0, 1, 0, 1, 2]);
    // 5 entries: root at 7 + 5 = 12
    let root = object_body(&text, 12);

    assert!(root.contains("/First 7 0 R"));
    assert!(root.contains("/Last 9 0 R"));
}

#[test]
fn test_every_entry_is_a_leaf_count() {
    let text = build_with_levels(&[0, 1, 2]);
    for number in 7..=9 {
        let body = object_body(&text, number);
        assert!(body.contains("/Count 0"), "object {}: {}", number, body);
    }
}

#[test]
fn test_destinations_target_page_objects() {
    let text = build_with_levels(&[0, 0]);
    // both pages exist before bookmarks are added, so every bookmark targets
    // the current (second) page at object 6
    let e0 = object_body(&text, 7);
    assert!(e0.contains("/Dest [6 0 R /XYZ 0 700 null]"), "{}", e0);
    let e1 = object_body(&text, 8);
    assert!(e1.contains("/Dest [6 0 R /XYZ 0 699 null]"), "{}", e1);
}

#[test]
fn test_catalog_outline_wiring() {
    let text = build_with_levels(&[0]);
    assert!(text.contains("/Outlines 8 0 R"));
    assert!(text.contains("/PageMode /UseOutlines"));
}

#[test]
fn test_no_bookmarks_emits_nothing() {
    let mut builder = DocumentBuilder::new();
    builder.add_letter_page().finish();
    let bytes = builder.build().unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(!text.contains("/Outlines"));
    assert!(!text.contains("/PageMode"));
    assert!(!text.contains("/Title"));
}
