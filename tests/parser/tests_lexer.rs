//! Lexer behaviour through the public API

use kdl_sitter::parser::{LexError, Lexer, ScanState, tokenize};
use kdl_sitter::{LineCol, SyntaxKind, TextSize};
use rstest::rstest;

use crate::helpers::kdl_fixtures::*;

fn significant(input: &str) -> Vec<SyntaxKind> {
    tokenize(input)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .map(|t| t.kind)
        .collect()
}

#[rstest]
#[case(SIMPLE_NODE)]
#[case(NESTED_CHILDREN)]
#[case(PACKAGE_MANIFEST)]
#[case(TYPED_VALUES)]
#[case(SLASHDASHED_PARTS)]
#[case(LINE_CONTINUATION)]
#[case(MIXED_TERMINATORS)]
fn test_tokens_are_contiguous(#[case] input: &str) {
    let tokens = tokenize(input);
    let mut offset = TextSize::new(0);
    for token in &tokens {
        assert_eq!(token.range.start(), offset, "gap before {token:?}");
        assert!(!token.range.is_empty());
        offset = token.range.end();
    }
    assert_eq!(offset, TextSize::of(input));
}

#[rstest]
#[case(SIMPLE_NODE)]
#[case(PACKAGE_MANIFEST)]
#[case(TYPED_VALUES)]
#[case("a \"\"\"\n  multi\n  \"\"\" b\n")]
#[case("x ##\"raw \"# still\"## y\n")]
fn test_resume_from_any_token_matches_full_scan(#[case] input: &str) {
    let full = tokenize(input);
    for (i, token) in full.iter().enumerate() {
        let resumed: Vec<_> = Lexer::resume(input, token.range.start(), token.state).collect();
        assert_eq!(resumed, full[i..], "resume at token {i}");
    }
}

#[test]
fn test_typed_values_token_stream() {
    assert_eq!(
        significant("(date)created count=(u8)0xff\n"),
        vec![
            SyntaxKind::L_PAREN,
            SyntaxKind::BARE_IDENT,
            SyntaxKind::R_PAREN,
            SyntaxKind::BARE_IDENT,
            SyntaxKind::BARE_IDENT,
            SyntaxKind::EQ,
            SyntaxKind::L_PAREN,
            SyntaxKind::BARE_IDENT,
            SyntaxKind::R_PAREN,
            SyntaxKind::HEX_NUMBER,
            SyntaxKind::NEWLINE,
        ]
    );
}

#[test]
fn test_string_tokens_record_their_scan_state() {
    let tokens = tokenize("a \"x\" #\"y\"#\n");
    let states: Vec<_> = tokens.iter().map(|t| (t.kind, t.state)).collect();
    let raw = ScanState::Raw {
        hashes: 1,
        multiline: false,
    };
    assert_eq!(
        states,
        vec![
            (SyntaxKind::BARE_IDENT, ScanState::Normal),
            (SyntaxKind::WHITESPACE, ScanState::Normal),
            (SyntaxKind::QUOTE, ScanState::Normal),
            (SyntaxKind::STRING_FRAGMENT, ScanState::Quoted),
            (SyntaxKind::QUOTE, ScanState::Quoted),
            (SyntaxKind::WHITESPACE, ScanState::Normal),
            (SyntaxKind::RAW_STRING_START, ScanState::Normal),
            (SyntaxKind::RAW_STRING_CONTENT, raw),
            (SyntaxKind::RAW_STRING_END, raw),
            (SyntaxKind::NEWLINE, ScanState::Normal),
        ]
    );
}

#[test]
fn test_snapshot_tracks_offset_and_state() {
    let mut lexer = Lexer::new("a \"b\"");
    lexer.by_ref().take(3).for_each(drop);
    let snapshot = lexer.snapshot();
    assert_eq!(snapshot.offset, TextSize::new(3));
    assert_eq!(snapshot.state, ScanState::Quoted);

    let rest: Vec<_> = Lexer::resume("a \"b\"", snapshot.offset, snapshot.state)
        .map(|t| t.kind)
        .collect();
    assert_eq!(rest, vec![SyntaxKind::STRING_FRAGMENT, SyntaxKind::QUOTE]);
}

#[test]
fn test_line_columns_follow_every_newline_form() {
    let tokens = tokenize(MIXED_TERMINATORS);
    let starts: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == SyntaxKind::BARE_IDENT)
        .map(|t| t.start)
        .collect();
    assert_eq!(
        starts,
        vec![
            LineCol::new(0, 0),
            LineCol::new(0, 3),
            LineCol::new(0, 6),
            LineCol::new(1, 0),
            LineCol::new(2, 0),
            LineCol::new(3, 0),
        ]
    );
}

#[rstest]
#[case("a [", LexError::UnrecognizedCharacter)]
#[case("a /* open", LexError::UnterminatedComment)]
#[case("a \"\\x\"", LexError::InvalidEscape)]
#[case("a \"\\u{}\"", LexError::InvalidEscape)]
#[case("a \\ b", LexError::DanglingEscline)]
fn test_lex_errors(#[case] input: &str, #[case] expected: LexError) {
    let errors: Vec<_> = tokenize(input)
        .into_iter()
        .filter(|t| t.kind == SyntaxKind::ERROR)
        .map(|t| t.error)
        .collect();
    assert_eq!(errors, vec![Some(expected)]);
}

#[test]
fn test_lexing_never_stalls_on_garbage() {
    let input = "\u{0}\u{7F}[]]\\\\#\"\"\"\u{FEFF}=}{";
    let tokens = tokenize(input);
    assert!(tokens.len() <= input.len());
    assert_eq!(tokens.last().map(|t| t.range.end()), Some(TextSize::of(input)));
}
