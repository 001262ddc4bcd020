//! Outline model and loader tests

use super::{NodeId, Outline, OutlineDoc, OutlineError};

/* ===================== Helpers ===================== */

/// A
/// ├── B
/// │   └── C
/// └── D
/// E
fn sample() -> (Outline, [NodeId; 5]) {
    let mut outline = Outline::new();
    let a = outline.add_root("A", "a body\n");
    let b = outline.add_child(a, "B", "").unwrap();
    let c = outline.add_child(b, "C", "").unwrap();
    let d = outline.add_child(a, "D", "").unwrap();
    let e = outline.add_root("E", "");
    (outline, [a, b, c, d, e])
}

/* ===================== Traversal ===================== */

#[test]
fn test_thread_next_walks_preorder() {
    let (outline, [a, b, c, d, e]) = sample();

    let order: Vec<NodeId> = outline.iter().collect();
    assert_eq!(order, vec![a, b, c, d, e]);
    assert_eq!(outline.thread_next(e), None);
}

#[test]
fn test_node_after_tree_skips_subtree() {
    let (outline, [a, b, c, d, e]) = sample();

    assert_eq!(outline.node_after_tree(a), Some(e));
    assert_eq!(outline.node_after_tree(b), Some(d));
    assert_eq!(outline.node_after_tree(c), Some(d));
    assert_eq!(outline.node_after_tree(e), None);
}

#[test]
fn test_level_and_parent() {
    let (outline, [a, b, c, _, e]) = sample();

    assert_eq!(outline.level(a), 0);
    assert_eq!(outline.level(c), 2);
    assert_eq!(outline.parent(c), Some(b));
    assert_eq!(outline.parent(e), None);
}

#[test]
fn test_insert_after_places_sibling() {
    let (mut outline, [a, b, _, d, _]) = sample();

    let new = outline.insert_after(b, "New").unwrap();

    assert_eq!(outline.children(a), &[b, new, d]);
    assert_eq!(outline.body(new), Some(""));
}

#[test]
fn test_unknown_node_is_rejected() {
    let (mut outline, _) = sample();
    let bogus = NodeId(99);

    assert!(!outline.contains(bogus));
    assert_eq!(outline.headline(bogus), None);
    assert_eq!(
        outline.set_body(bogus, "x"),
        Err(OutlineError::UnknownNode(bogus))
    );
    assert_eq!(outline.select(bogus), Err(OutlineError::UnknownNode(bogus)));
}

#[test]
fn test_find_returns_first_match() {
    let (mut outline, [_, b, _, _, _]) = sample();
    outline.add_root("B", "");

    assert_eq!(outline.find("B"), Some(b));
    assert_eq!(outline.find("missing"), None);
}

/* ===================== Org Format ===================== */

#[test]
fn test_parse_org_outline() {
    let source = "* Demo\nline one\nline two\n** Step\nstep body\n* Other\n";

    let outline = Outline::from_org_str(source).unwrap();

    let demo = outline.find("Demo").unwrap();
    let step = outline.find("Step").unwrap();
    assert_eq!(outline.body(demo), Some("line one\nline two\n"));
    assert_eq!(outline.body(step), Some("step body\n"));
    assert_eq!(outline.parent(step), Some(demo));
    assert_eq!(outline.roots().len(), 2);
}

#[test]
fn test_parse_org_rejects_level_skip() {
    let err = Outline::from_org_str("* A\n*** C\n").unwrap_err();
    assert_eq!(err, OutlineError::LevelSkip { line: 2, level: 3 });
}

#[test]
fn test_parse_org_rejects_orphan_body() {
    let err = Outline::from_org_str("\nstray\n* A\n").unwrap_err();
    assert_eq!(err, OutlineError::OrphanBody { line: 2 });
}

#[test]
fn test_bold_text_is_not_a_headline() {
    let outline = Outline::from_org_str("* A\n**bold** text\n").unwrap();
    assert_eq!(outline.len(), 1);
    assert_eq!(outline.body(NodeId(0)), Some("**bold** text\n"));
}

#[test]
fn test_org_escaped_star_lines_survive() {
    let mut outline = Outline::new();
    outline.add_root("A", "* not a headline\n\\* literal\n");

    let text = outline.to_org_string();
    let reparsed = Outline::from_org_str(&text).unwrap();

    assert_eq!(reparsed.len(), 1);
    assert_eq!(reparsed.body(NodeId(0)), Some("* not a headline\n\\* literal\n"));
}

/* ===================== JSON Format ===================== */

#[test]
fn test_parse_json_outline() {
    let source = r#"[
        {"headline": "Demo", "body": "x = 1\n", "children": [
            {"headline": "Child"}
        ]}
    ]"#;

    let outline = Outline::from_json_str(source).unwrap();

    let child = outline.find("Child").unwrap();
    assert_eq!(outline.body(child), Some(""));
    assert_eq!(outline.parent(child), outline.find("Demo"));
}

#[test]
fn test_docs_mirror_tree() {
    let (outline, _) = sample();

    let docs = outline.to_docs();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].children.len(), 2);
    assert_eq!(
        docs[0].children[0].children,
        vec![OutlineDoc {
            headline: "C".to_string(),
            body: String::new(),
            children: vec![],
        }]
    );
}

#[test]
fn test_invalid_json_is_reported() {
    let err = Outline::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, OutlineError::Json(_)));
}
