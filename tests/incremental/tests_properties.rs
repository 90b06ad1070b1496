//! Property tests: parsing is total and re-parsing agrees with parsing

use kdl_sitter::{Edit, TextRange, TextSize, parse, reparse};
use proptest::prelude::*;

use crate::helpers::tree_assertions::{
    assert_error_flags_consistent, assert_lossless, assert_well_formed, shape,
};

/// Fragments that combine into mostly-KDL text, broken in interesting ways
const PIECES: &[&str] = &[
    "node", "a", "b-c", " ", "  ", "\t", "\n", "\r\n", ";", "{", "}", "(", ")", "=", "/-", "\"",
    "\"\"\"", "#\"", "\"#", "#\"\"\"", "\"\"\"#", "\\", "\\n", "\\q", "1", "-2.5", "0x1f", "#true",
    "#null", "//", "/*", "*/", "x=1", "\"str\"", "(t)", "[", "é",
];

fn soup(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..max).prop_map(|parts| parts.concat())
}

/// A text and one edit of it: replaced range plus inserted text
fn edited() -> impl Strategy<Value = (String, TextRange, String)> {
    (soup(40), any::<prop::sample::Index>(), 0usize..8, soup(4)).prop_map(
        |(text, start, len, insert)| {
            let start = floor_char_boundary(&text, start.index(text.len() + 1));
            let end = floor_char_boundary(&text, (start + len).min(text.len()));
            let range = TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32));
            (text, range, insert)
        },
    )
}

fn floor_char_boundary(text: &str, mut at: usize) -> usize {
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

proptest! {
    #[test]
    fn prop_parse_is_total_on_any_text(text in "\\PC{0,64}") {
        let tree = parse(&text);
        assert_well_formed(&tree);
        assert_lossless(&tree);
        assert_error_flags_consistent(&tree);
    }

    #[test]
    fn prop_parse_is_total_on_token_soup(text in soup(60)) {
        let tree = parse(&text);
        assert_well_formed(&tree);
        assert_lossless(&tree);
        assert_error_flags_consistent(&tree);
        if tree.has_error() {
            prop_assert!(!tree.diagnostics().is_empty());
        }
    }

    #[test]
    fn prop_reparse_equals_fresh_parse((text, range, insert) in edited()) {
        let old = parse(&text);
        let mut new = text.clone();
        new.replace_range(std::ops::Range::<usize>::from(range), &insert);

        let reparsed = reparse(&old, &[Edit::replace(range, &insert)], &new).unwrap();
        let fresh = parse(&new);
        prop_assert_eq!(shape(&reparsed), shape(&fresh));
        prop_assert!(reparsed.same_shape(&fresh));
        prop_assert_eq!(reparsed.text(), new.as_str());
    }
}
