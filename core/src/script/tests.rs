//! Fragment extraction tests

use super::extract::DEFAULT_DELIMITER;
use super::{extract_fragments, split_fragments, ExtractOptions};
use crate::error::DemoError;
use crate::outline::{NodeId, Outline};

fn texts(outline: &Outline, root: NodeId) -> Vec<String> {
    extract_fragments(outline, root, &ExtractOptions::default())
        .unwrap()
        .into_iter()
        .map(|f| f.text)
        .collect()
}

/* ===================== Splitting ===================== */

#[test]
fn test_split_on_delimiter_lines() {
    let fragments = split_fragments("a\n###\nb\n###\nc", DEFAULT_DELIMITER);
    assert_eq!(fragments, vec!["a\n", "b\n", "c"]);
}

#[test]
fn test_comments_and_blank_lines_dropped() {
    assert!(split_fragments("# comment\n\n   \n", DEFAULT_DELIMITER).is_empty());

    let fragments = split_fragments("x = 1\n    # indented comment\n\ny = 2\n", DEFAULT_DELIMITER);
    assert_eq!(fragments, vec!["x = 1\ny = 2\n"]);
}

#[test]
fn test_delimiter_with_trailing_text_and_repeats() {
    let fragments = split_fragments("### first\n###\nx = 1\n### second\n### third\n", DEFAULT_DELIMITER);
    assert_eq!(fragments, vec!["x = 1\n"]);
}

#[test]
fn test_indentation_preserved() {
    let block = "if (true) {\n    p.b = 'x'\n}\r\n";
    assert_eq!(split_fragments(block, DEFAULT_DELIMITER), vec![block]);
}

#[test]
fn test_custom_delimiter() {
    let fragments = split_fragments("a = 1\n---\nb = 2\n### not a split\n", "---");
    // "###..." is a comment line under any delimiter
    assert_eq!(fragments, vec!["a = 1\n", "b = 2\n"]);
}

#[test]
fn test_indented_delimiter_is_a_comment() {
    let fragments = split_fragments("a = 1\n  ###\nb = 2\n", DEFAULT_DELIMITER);
    assert_eq!(fragments, vec!["a = 1\nb = 2\n"]);
}

/* ===================== Tree Walk ===================== */

#[test]
fn test_extract_walks_tree_in_order() {
    let mut outline = Outline::new();
    let root = outline.add_root("demo", "a = 1\n###\nb = 2\n");
    let child = outline.add_child(root, "step", "c = 3\n").unwrap();
    outline.add_child(child, "deeper", "d = 4\n").unwrap();
    outline.add_root("other", "e = 5\n");

    assert_eq!(texts(&outline, root), vec!["a = 1\n", "b = 2\n", "c = 3\n", "d = 4\n"]);
}

#[test]
fn test_fragments_remember_their_node() {
    let mut outline = Outline::new();
    let root = outline.add_root("demo", "");
    let step = outline.add_child(root, "step", "x = 1\n###\ny = 2\n").unwrap();

    let fragments = extract_fragments(&outline, root, &ExtractOptions::default()).unwrap();
    assert_eq!(fragments.len(), 2);
    assert!(fragments.iter().all(|f| f.node == step));
}

#[test]
fn test_ignore_markers() {
    let mut outline = Outline::new();
    let root = outline.add_root("demo", "a = 1\n");
    let skipped = outline.add_child(root, "@ignore notes", "not script\n").unwrap();
    outline.add_child(skipped, "kept", "b = 2\n").unwrap();
    let pruned = outline.add_child(root, "@ignore-tree drafts", "nope\n").unwrap();
    outline.add_child(pruned, "also pruned", "nope\n").unwrap();
    outline.add_child(root, "tail", "c = 3\n").unwrap();

    assert_eq!(texts(&outline, root), vec!["a = 1\n", "b = 2\n", "c = 3\n"]);
}

#[test]
fn test_ignored_root() {
    let mut outline = Outline::new();
    let root = outline.add_root("@ignore-tree demo", "a = 1\n");
    outline.add_child(root, "step", "b = 2\n").unwrap();

    assert!(texts(&outline, root).is_empty());
}

#[test]
fn test_custom_markers() {
    let mut outline = Outline::new();
    let root = outline.add_root("demo", "");
    outline.add_child(root, "SKIP me", "a = 1\n").unwrap();
    outline.add_child(root, "@ignore not for us", "b = 2\n").unwrap();

    let options = ExtractOptions {
        ignore_node_marker: "SKIP".to_string(),
        ..ExtractOptions::default()
    };
    let fragments = extract_fragments(&outline, root, &options).unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].text, "b = 2\n");
}

#[test]
fn test_no_usable_bodies() {
    let mut outline = Outline::new();
    let root = outline.add_root("demo", "   \n");
    outline.add_child(root, "notes", "# just a comment\n").unwrap();

    assert!(texts(&outline, root).is_empty());
}

#[test]
fn test_unknown_root() {
    let outline = Outline::new();
    let err = extract_fragments(&outline, NodeId(3), &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, DemoError::InvalidRoot(_)));
}

#[test]
fn test_never_yields_blank_fragments() {
    let blocks = [
        "###\n###\n",
        "\n\n###\n  \n",
        "#a\n###\n#b\n",
        "x\n###",
        "###x\ny\n",
    ];
    for block in blocks {
        for fragment in split_fragments(block, DEFAULT_DELIMITER) {
            assert!(!fragment.trim().is_empty(), "blank fragment from {:?}", block);
        }
    }
}
