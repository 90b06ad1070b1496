//! Navigating parsed trees

use kdl_sitter::{LineCol, Span, SyntaxKind, TextSize, parse};

use crate::helpers::kdl_fixtures::*;
use crate::helpers::tree_assertions::range;

#[test]
fn test_sexp_of_every_entry_kind() {
    let tree = parse("(t)n 1 k=#true \"s\" {\n  c\n}\n");
    assert_eq!(
        tree.to_sexp(),
        "(document (node (type (identifier)) (identifier) (argument (number)) \
         (property (identifier) (keyword)) (argument (string)) \
         (children (node (identifier)))))"
    );
}

#[test]
fn test_bare_identifier_values_are_identifiers() {
    let tree = parse("node value\n");
    assert_eq!(
        tree.to_sexp(),
        "(document (node (identifier) (argument (identifier))))"
    );
}

#[test]
fn test_empty_document() {
    let tree = parse("");
    assert_eq!(tree.to_sexp(), "(document)");
    assert!(tree.is_empty());
    assert_eq!(tree.root().range(), range(0, 0));
    assert!(!tree.has_error());
}

#[test]
fn test_covering_node_finds_deepest_node() {
    let tree = parse(NESTED_CHILDREN);
    // "node { child }\n": `child` starts at 7
    let leaf = tree.covering_node(TextSize::new(8));
    assert_eq!(leaf.kind(), SyntaxKind::BARE_IDENT);
    assert_eq!(leaf.text(), "child");

    let kinds: Vec<_> = leaf.ancestors().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::IDENTIFIER,
            SyntaxKind::NODE,
            SyntaxKind::CHILDREN,
            SyntaxKind::NODE,
            SyntaxKind::DOCUMENT,
        ]
    );
}

#[test]
fn test_covering_node_at_end_of_text_is_root() {
    let tree = parse(SIMPLE_NODE);
    assert_eq!(tree.covering_node(tree.len()).kind(), SyntaxKind::DOCUMENT);
}

#[test]
fn test_spans_use_line_index() {
    let tree = parse(NESTED_CHILDREN.replace("{ child }", "{\n    child\n}").as_str());
    let child = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::NODE)
        .nth(1)
        .unwrap();
    let name = child.child_of_kind(SyntaxKind::IDENTIFIER).unwrap();
    assert_eq!(name.span(), Span::new(LineCol::new(1, 4), LineCol::new(1, 9)));
    assert!(name.span().is_single_line());
    assert!(!tree.root().span().is_single_line());
}

#[test]
fn test_tokens_concatenate_to_source() {
    let tree = parse(PACKAGE_MANIFEST);
    let text: String = tree.root().tokens().map(|t| t.text()).collect();
    assert_eq!(text, PACKAGE_MANIFEST);
}

#[test]
fn test_siblings_walk_in_order() {
    let tree = parse("a\nb\nc\n");
    let first = tree.root().first_child().unwrap();
    let names: Vec<_> = std::iter::successors(Some(first), |n| n.next_sibling())
        .map(|n| n.child_of_kind(SyntaxKind::IDENTIFIER).unwrap().text())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);

    let last = tree.root().last_child().unwrap();
    assert_eq!(last.prev_sibling().and_then(|n| n.prev_sibling()), Some(first));
    assert_eq!(tree.root().child_count(), 3);
}

#[test]
fn test_get_rejects_foreign_ids() {
    let big = parse(PACKAGE_MANIFEST);
    let small = parse("a");
    let root = big.root().id();
    assert!(small.get(root).is_none());
    assert_eq!(big.get(root).map(|n| n.kind()), Some(SyntaxKind::DOCUMENT));
}

#[test]
fn test_debug_dump_marks_missing_and_slashdashed() {
    let tree = parse("/-a \"x\nb {\n");
    let dump = tree.debug_dump();
    assert!(dump.starts_with("DOCUMENT@0..11\n"), "{dump}");
    assert!(dump.contains(" SLASHDASHED"));
    assert!(dump.contains("MISSING"));
}

#[test]
fn test_clones_have_the_same_shape() {
    let tree = parse(SLASHDASHED_PARTS);
    let copy = tree.clone();
    assert!(copy.same_shape(&tree));
    assert!(!parse("a\n").same_shape(&parse("ab\n")));
}
