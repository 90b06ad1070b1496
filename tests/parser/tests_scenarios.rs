//! End-to-end parses of valid KDL documents

use kdl_sitter::parser::ErrorCode;
use kdl_sitter::{SyntaxKind, parse};
use rstest::rstest;

use crate::helpers::kdl_fixtures::*;
use crate::helpers::tree_assertions::{assert_error_flags_consistent, assert_lossless, assert_well_formed};

#[test]
fn test_node_with_string_argument() {
    let tree = parse("node \"value\"");
    assert_eq!(tree.to_sexp(), "(document (node (identifier) (argument (string))))");
    assert!(tree.diagnostics().is_empty());
    assert!(!tree.has_error());
}

#[test]
fn test_node_with_children() {
    let tree = parse(NESTED_CHILDREN);
    let node = tree.root().child_of_kind(SyntaxKind::NODE).unwrap();
    let children = node.child_of_kind(SyntaxKind::CHILDREN).unwrap();
    let child = children.child_of_kind(SyntaxKind::NODE).unwrap();
    let name = child.child_of_kind(SyntaxKind::IDENTIFIER).unwrap();
    assert_eq!(name.text(), "child");
    assert_eq!(child.parent(), Some(children));
    assert!(!tree.has_error());
}

#[test]
fn test_unterminated_string_recovers() {
    let input = "node \"unterminated";
    let tree = parse(input);
    assert_eq!(tree.root().text(), input);
    assert!(tree.has_error());

    let string = tree
        .root()
        .descendants()
        .find(|n| n.kind() == SyntaxKind::STRING)
        .unwrap();
    assert!(string.has_error());
    assert!(
        string
            .children()
            .any(|c| c.is_missing() && c.kind() == SyntaxKind::QUOTE)
    );
    assert_eq!(tree.diagnostics()[0].code, ErrorCode::E0102);
    assert_eq!(
        tree.to_sexp(),
        "(document (node (identifier) (argument (string (MISSING '\"')))))"
    );
}

#[test]
fn test_slashdashed_node_is_inactive() {
    let tree = parse("/-node \"x\"");
    let node = tree.root().child_of_kind(SyntaxKind::NODE).unwrap();
    assert!(node.is_slashdashed());
    assert!(!node.is_active());
    for descendant in node.descendants().skip(1) {
        assert!(!descendant.is_active());
    }
}

#[test]
fn test_package_manifest() {
    let tree = parse(PACKAGE_MANIFEST);
    assert!(!tree.has_error(), "{}", tree.debug_dump());
    assert_well_formed(&tree);
    assert_lossless(&tree);

    let package = tree.root().child_of_kind(SyntaxKind::NODE).unwrap();
    let block = package.child_of_kind(SyntaxKind::CHILDREN).unwrap();
    let names: Vec<_> = block
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .map(|n| n.child_of_kind(SyntaxKind::IDENTIFIER).unwrap().text())
        .collect();
    assert_eq!(names, ["name", "version", "dependencies", "scripts", "unused-field"]);

    let unused = block
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .last()
        .unwrap();
    assert!(unused.is_slashdashed());
}

#[test]
fn test_typed_values() {
    let tree = parse(TYPED_VALUES);
    assert!(!tree.has_error(), "{}", tree.debug_dump());
    let node = tree.root().child_of_kind(SyntaxKind::NODE).unwrap();
    assert!(node.child_of_kind(SyntaxKind::TYPE).is_some());
    let properties: Vec<_> = node
        .children()
        .filter(|c| c.kind() == SyntaxKind::PROPERTY)
        .collect();
    assert_eq!(properties.len(), 4);
    assert!(properties[0].child_of_kind(SyntaxKind::TYPE).is_some());
    let numbers: Vec<_> = node
        .descendants()
        .filter(|n| n.kind().is_number())
        .map(|n| n.kind())
        .collect();
    assert_eq!(
        numbers,
        [
            SyntaxKind::HEX_NUMBER,
            SyntaxKind::DECIMAL_NUMBER,
            SyntaxKind::BINARY_NUMBER,
            SyntaxKind::OCTAL_NUMBER
        ]
    );
}

#[test]
fn test_slashdash_on_every_position() {
    let tree = parse(SLASHDASHED_PARTS);
    assert!(!tree.has_error(), "{}", tree.debug_dump());

    let parent = tree.root().child_of_kind(SyntaxKind::NODE).unwrap();
    let flags: Vec<_> = parent
        .children()
        .filter(|c| !c.is_trivia() && c.kind() != SyntaxKind::IDENTIFIER && c.kind() != SyntaxKind::NEWLINE)
        .map(|c| (c.kind(), c.is_slashdashed()))
        .collect();
    assert_eq!(
        flags,
        [
            (SyntaxKind::ARGUMENT, true),
            (SyntaxKind::ARGUMENT, false),
            (SyntaxKind::PROPERTY, true),
            (SyntaxKind::CHILDREN, false),
            (SyntaxKind::CHILDREN, true),
        ]
    );

    let skipped = tree
        .root()
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .nth(1)
        .unwrap();
    assert!(skipped.is_slashdashed());
}

#[test]
fn test_line_continuation_joins_lines() {
    let tree = parse(LINE_CONTINUATION);
    assert!(!tree.has_error(), "{}", tree.debug_dump());
    let nodes: Vec<_> = tree
        .root()
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .collect();
    assert_eq!(nodes.len(), 2);
    let arguments = nodes[0]
        .children()
        .filter(|c| c.kind() == SyntaxKind::ARGUMENT)
        .count();
    assert_eq!(arguments, 3);
}

#[test]
fn test_every_newline_form_terminates() {
    let tree = parse(MIXED_TERMINATORS);
    assert!(!tree.has_error(), "{}", tree.debug_dump());
    let count = tree
        .root()
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .count();
    assert_eq!(count, 6);
}

#[rstest]
#[case("")]
#[case("\n\n\n")]
#[case("// only a comment")]
#[case("/* block */\n")]
#[case("\u{FEFF}node\n")]
#[case("node")]
#[case("node;")]
#[case("a { b { c { d } } }")]
#[case("node \"\" #\"\"# \"\"\"\n\"\"\"")]
#[case("node #-inf #inf #nan #null #false")]
#[case("node -1 +2 1_000 1.0e10 0xdead_beef")]
#[case("\"name with spaces\" \"key\"=1")]
#[case("node {}\n")]
#[case("node\t{\n}\n")]
fn test_valid_documents_have_no_errors(#[case] input: &str) {
    let tree = parse(input);
    assert!(!tree.has_error(), "{input:?}\n{}", tree.debug_dump());
    assert!(tree.diagnostics().is_empty());
    assert_well_formed(&tree);
    assert_lossless(&tree);
    assert_error_flags_consistent(&tree);
}

#[test]
fn test_many_siblings() {
    let text = many_nodes(500);
    let tree = parse(&text);
    assert!(!tree.has_error());
    assert_eq!(
        tree.root()
            .children()
            .filter(|c| c.kind() == SyntaxKind::NODE)
            .count(),
        500
    );
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let text = deeply_nested(5_000);
    let tree = parse(&text);
    assert!(!tree.has_error());
    assert_eq!(tree.to_sexp().matches("(children").count(), 5_000);
    assert_well_formed(&tree);
}
