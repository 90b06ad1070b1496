//! Error recovery: malformed input always yields a complete tree

use kdl_sitter::parser::{ErrorCode, ParseOptions};
use kdl_sitter::{SyntaxKind, TextRange, TextSize, parse, parse_with_options};
use rstest::rstest;

use crate::helpers::kdl_fixtures::BROKEN;
use crate::helpers::tree_assertions::{assert_error_flags_consistent, assert_lossless, assert_well_formed};

#[test]
fn test_broken_documents_produce_complete_trees() {
    for input in BROKEN {
        let tree = parse(input);
        assert!(tree.has_error(), "{input:?} parsed without error\n{}", tree.debug_dump());
        assert!(!tree.diagnostics().is_empty(), "{input:?}");
        assert_well_formed(&tree);
        assert_lossless(&tree);
        assert_error_flags_consistent(&tree);
    }
}

#[test]
fn test_broken_documents_without_insertion() {
    let options = ParseOptions::without_insertion();
    for input in BROKEN {
        let tree = parse_with_options(input, &options);
        assert!(tree.has_error(), "{input:?}");
        assert!(!tree.root().descendants().any(|n| n.is_missing()), "{input:?}");
        assert_well_formed(&tree);
        assert_lossless(&tree);
    }
}

#[rstest]
#[case("a [\n", ErrorCode::E0101)]
#[case("node \"open", ErrorCode::E0102)]
#[case("a /* x", ErrorCode::E0103)]
#[case("a \"\\q\"", ErrorCode::E0104)]
#[case("a \\ b", ErrorCode::E0105)]
#[case("a {} )\n", ErrorCode::E0201)]
#[case("a {\n", ErrorCode::E0202)]
#[case("(t node", ErrorCode::E0203)]
#[case("}\n", ErrorCode::E0204)]
#[case("= 1\n", ErrorCode::E0301)]
#[case("a {} 1\n", ErrorCode::E0302)]
#[case("a k=\n", ErrorCode::E0303)]
#[case("a ()\n", ErrorCode::E0304)]
#[case("/-\n", ErrorCode::E0305)]
fn test_first_diagnostic_code(#[case] input: &str, #[case] code: ErrorCode) {
    let tree = parse(input);
    let first = tree.diagnostics().first().unwrap_or_else(|| panic!("no diagnostic for {input:?}"));
    assert_eq!(first.code, code, "{input:?}: {}", first.report());
}

#[test]
fn test_unexpected_token_message_names_context() {
    let tree = parse("a k=\n");
    let error = &tree.diagnostics()[0];
    assert_eq!(
        error.message,
        "unexpected newline in property value, expected a value"
    );
    assert_eq!(error.range, TextRange::new(TextSize::new(4), TextSize::new(5)));
    let hint = error.hint.as_deref().unwrap();
    assert!(hint.starts_with("expected one of: "), "{hint}");
    assert!(hint.contains("identifier"), "{hint}");
}

#[test]
fn test_missing_brace_points_at_opener() {
    let tree = parse("outer {\n  inner {\n    leaf\n");
    let errors = tree.diagnostics();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors.iter().all(|e| e.code == ErrorCode::E0202));
    // The innermost block is closed first
    assert_eq!(
        errors[0].related[0].range,
        TextRange::new(TextSize::new(16), TextSize::new(17))
    );
    assert_eq!(
        errors[1].related[0].range,
        TextRange::new(TextSize::new(6), TextSize::new(7))
    );
    let missing = tree
        .root()
        .descendants()
        .filter(|n| n.is_missing())
        .count();
    assert_eq!(missing, 2);
}

#[test]
fn test_unterminated_quote_before_newline_has_hint() {
    let tree = parse("a \"open\nb\n");
    let error = &tree.diagnostics()[0];
    assert_eq!(error.code, ErrorCode::E0102);
    assert!(error.has_hint());
    let nodes = tree
        .root()
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .count();
    assert_eq!(nodes, 2);
}

#[test]
fn test_error_nodes_keep_following_nodes_intact() {
    let tree = parse("good 1\n= = =\nalso-good 2\n");
    let nodes: Vec<_> = tree
        .root()
        .children()
        .filter(|c| c.kind() == SyntaxKind::NODE)
        .collect();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| !n.has_error()));
    assert_eq!(
        tree.root().child_of_kind(SyntaxKind::ERROR).map(|e| e.text()),
        Some("= = =")
    );
}

#[test]
fn test_recovery_is_bounded_on_pathological_input() {
    let input = "}".repeat(2_000) + &"(".repeat(2_000) + &"=".repeat(2_000);
    let tree = parse(&input);
    assert!(tree.has_error());
    assert_well_formed(&tree);
    assert!(tree.stats().recoveries <= input.len() * 4);
}

#[test]
fn test_diagnostics_are_sorted_by_position() {
    let tree = parse("a {} 1\n= x\nb k=\nc \"open");
    let starts: Vec<_> = tree.diagnostics().iter().map(|d| d.range.start()).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
    assert!(starts.len() >= 4, "{:?}", tree.diagnostics());
}

#[test]
fn test_truncated_deep_nesting_keeps_every_block() {
    let depth = 2_000;
    let input = "a {\n".repeat(depth);
    let tree = parse(&input);

    let missing = tree.root().descendants().filter(|n| n.is_missing()).count();
    assert_eq!(missing, depth);
    assert!(!tree.root().descendants().any(|n| n.kind() == SyntaxKind::ERROR));
    let children = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::CHILDREN)
        .count();
    assert_eq!(children, depth);
    assert_eq!(tree.diagnostics().len(), depth);
    assert!(tree.diagnostics().iter().all(|e| e.code == ErrorCode::E0202));
}

#[test]
fn test_garbage_at_depth_stays_in_the_innermost_block() {
    let depth = 10_000;
    let input = "a {\n".repeat(depth) + &"= ".repeat(depth);
    let tree = parse(&input);
    assert_eq!(tree.root().range(), TextRange::up_to(TextSize::of(input.as_str())));

    let errors: Vec<_> = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::ERROR)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text().matches('=').count(), depth);
    assert_eq!(errors[0].parent().map(|p| p.kind()), Some(SyntaxKind::CHILDREN));

    let missing = tree.root().descendants().filter(|n| n.is_missing()).count();
    assert_eq!(missing, depth);
}

#[test]
fn test_closer_of_an_outer_block_closes_inner_ones() {
    let tree = parse("a { b { c (t\n}\nd\n");
    let codes: Vec<_> = tree.diagnostics().iter().map(|d| d.code).collect();
    assert!(codes.contains(&ErrorCode::E0202), "{codes:?}");
    assert_well_formed(&tree);
    assert_lossless(&tree);
}
