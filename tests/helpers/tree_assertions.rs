//! Structural assertions shared by parser and incremental tests.

use kdl_sitter::{Edit, SyntaxKind, TextRange, TextSize, Tree};

/// Every node's range is the union of its children's, children are in
/// order and adjacent, and the root covers the whole text.
pub fn assert_well_formed(tree: &Tree) {
    let root = tree.root();
    assert_eq!(root.kind(), SyntaxKind::DOCUMENT);
    assert_eq!(
        root.range(),
        TextRange::up_to(tree.len()),
        "root does not cover the input\n{}",
        tree.debug_dump()
    );

    for node in root.descendants() {
        let children: Vec<_> = node.children().collect();
        let Some(first) = children.first() else {
            continue;
        };
        assert_eq!(node.range().start(), first.range().start(), "{}", tree.debug_dump());
        assert_eq!(
            node.range().end(),
            children[children.len() - 1].range().end(),
            "{}",
            tree.debug_dump()
        );
        for pair in children.windows(2) {
            assert_eq!(
                pair[0].range().end(),
                pair[1].range().start(),
                "gap or overlap between {:?} and {:?}\n{}",
                pair[0],
                pair[1],
                tree.debug_dump()
            );
        }
        for child in &children {
            assert_eq!(child.parent(), Some(node));
        }
    }
}

/// Concatenated leaf text reproduces the input
pub fn assert_lossless(tree: &Tree) {
    let text: String = tree.root().tokens().map(|t| t.text()).collect();
    assert_eq!(text, tree.text());
}

/// Error flags agree with the error and missing nodes below them
pub fn assert_error_flags_consistent(tree: &Tree) {
    for node in tree.root().descendants() {
        let below = node.descendants().any(|n| n.is_error() || n.is_missing());
        assert_eq!(node.has_error(), below, "{:?}\n{}", node, tree.debug_dump());
    }
}

/// Kind and range of every node in pre-order
pub fn shape(tree: &Tree) -> Vec<(SyntaxKind, TextRange)> {
    tree.root().descendants().map(|n| (n.kind(), n.range())).collect()
}

/// Apply `edits` (previous-text coordinates, increasing order) to `text`
pub fn apply_edits(text: &str, edits: &[(TextRange, &str)]) -> (String, Vec<Edit>) {
    let mut out = String::new();
    let mut at = 0;
    for (range, insert) in edits {
        out.push_str(&text[at..usize::from(range.start())]);
        out.push_str(insert);
        at = usize::from(range.end());
    }
    out.push_str(&text[at..]);
    let edits = edits.iter().map(|(range, insert)| Edit::replace(*range, insert)).collect();
    (out, edits)
}

pub fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}
