//! Modal lexer for KDL
//!
//! Normal-mode tokens come from a logos-generated DFA. String interiors are
//! scanned by hand because their token boundaries depend on the opening
//! delimiter, which is carried between calls in [`ScanState`].
//!
//! The lexer is re-entrant: [`Lexer::resume`] restarts at any offset given the
//! state recorded on the token at that offset.

use logos::Logos;
use thiserror::Error;

use super::syntax_kind::SyntaxKind;
use crate::base::{LineCol, LineIndex, TextRange, TextSize, addressable, newline_len, text_size};

/// Scanner mode between two tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanState {
    #[default]
    Normal,
    /// Inside `"..."`
    Quoted,
    /// Inside `"""..."""`
    Multiline,
    /// Inside `#"..."#`; `hashes` is the number of `#` in the delimiter
    Raw { hashes: u32, multiline: bool },
}

/// Why a token was lexed as `ERROR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LexError {
    #[error("unrecognized character")]
    UnrecognizedCharacter,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("line continuation must be followed by a newline")]
    DanglingEscline,
}

/// A token with its kind, range, and the scanner state it was lexed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    /// Line/column of the first byte
    pub start: LineCol,
    /// Scanner state before this token
    pub state: ScanState,
    pub error: Option<LexError>,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range]
    }
}

/// Position and mode the lexer can be resumed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexerSnapshot {
    pub offset: TextSize,
    pub state: ScanState,
}

/// Pull-based lexer over a whole source text
pub struct Lexer<'a> {
    text: &'a str,
    offset: usize,
    state: ScanState,
    lines: LineIndex,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::resume(text, TextSize::new(0), ScanState::Normal)
    }

    /// Start lexing at `offset` in the given state.
    ///
    /// Offsets past the end or inside a UTF-8 sequence are moved back to the
    /// nearest character boundary. Text past [`MAX_TEXT_LEN`](crate::base::MAX_TEXT_LEN)
    /// is not lexed.
    pub fn resume(text: &'a str, offset: TextSize, state: ScanState) -> Self {
        let text = addressable(text);
        let mut offset = usize::from(offset).min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        Self {
            text,
            offset,
            state,
            lines: LineIndex::new(text),
        }
    }

    pub fn offset(&self) -> TextSize {
        text_size(self.offset)
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn snapshot(&self) -> LexerSnapshot {
        LexerSnapshot {
            offset: self.offset(),
            state: self.state,
        }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn into_line_index(self) -> LineIndex {
        self.lines
    }

    /// Move past text that is already known to lex to `Normal` at `offset`
    pub(crate) fn skip_to(&mut self, offset: TextSize) {
        debug_assert!(usize::from(offset) >= self.offset);
        self.offset = usize::from(offset).min(self.text.len());
        self.state = ScanState::Normal;
    }

    /// Lex the next token, or `None` at the end of input
    pub fn next_token(&mut self) -> Option<Token> {
        if self.offset >= self.text.len() {
            return None;
        }
        let state = self.state;
        let text = self.text;
        let rest = &text[self.offset..];
        let (kind, len, error) = match state {
            ScanState::Normal => self.scan_normal(rest),
            ScanState::Quoted => self.scan_quoted(rest),
            ScanState::Multiline => {
                let at_line_start = text[..self.offset].ends_with(is_newline_char);
                self.scan_multiline(rest, at_line_start)
            }
            ScanState::Raw { hashes, multiline } => {
                self.scan_raw(rest, hashes as usize, multiline)
            }
        };
        debug_assert!(len > 0 && rest.is_char_boundary(len));

        let start = text_size(self.offset);
        self.offset += len;
        Some(Token {
            kind,
            range: TextRange::at(start, text_size(len)),
            start: self.lines.line_col(start),
            state,
            error,
        })
    }

    fn scan_normal(&mut self, rest: &str) -> Scanned {
        let mut inner = LogosToken::lexer(rest);
        let first_char = rest.chars().next().map_or(1, char::len_utf8);
        let Some(result) = inner.next() else {
            return (SyntaxKind::ERROR, first_char, Some(LexError::UnrecognizedCharacter));
        };
        let len = inner.span().end;

        match result {
            Ok(LogosToken::BlockComment(CommentEnd::Unclosed)) => {
                (SyntaxKind::ERROR, len, Some(LexError::UnterminatedComment))
            }
            Ok(LogosToken::Quote) => {
                self.state = ScanState::Quoted;
                (SyntaxKind::QUOTE, len, None)
            }
            Ok(LogosToken::TripleQuote) => {
                self.state = ScanState::Multiline;
                (SyntaxKind::TRIPLE_QUOTE, len, None)
            }
            Ok(LogosToken::RawStart(hashes)) => {
                self.state = ScanState::Raw {
                    hashes: u32::try_from(hashes).unwrap_or(u32::MAX),
                    multiline: false,
                };
                (SyntaxKind::RAW_STRING_START, len, None)
            }
            Ok(LogosToken::RawMultilineStart(hashes)) => {
                self.state = ScanState::Raw {
                    hashes: u32::try_from(hashes).unwrap_or(u32::MAX),
                    multiline: true,
                };
                (SyntaxKind::RAW_STRING_START, len, None)
            }
            Ok(token) => (token.into(), len, None),
            Err(()) if rest.starts_with('\\') => (
                SyntaxKind::ERROR,
                char_end(rest, len.max(first_char)),
                Some(LexError::DanglingEscline),
            ),
            Err(()) => {
                // Merge a run of unrecognized characters into one token
                let mut end = char_end(rest, len.max(first_char));
                while let Some(Err(())) = inner.next() {
                    if inner.span().start != end || rest[end..].starts_with('\\') {
                        break;
                    }
                    end = char_end(rest, inner.span().end);
                }
                (SyntaxKind::ERROR, end, Some(LexError::UnrecognizedCharacter))
            }
        }
    }

    fn scan_quoted(&mut self, rest: &str) -> Scanned {
        if rest.starts_with('"') {
            self.state = ScanState::Normal;
            return (SyntaxKind::QUOTE, 1, None);
        }
        if rest.starts_with('\\') {
            return scan_escape(rest);
        }
        if newline_len(rest).is_some() {
            // Unterminated: the newline belongs to the enclosing node
            self.state = ScanState::Normal;
            return self.scan_normal(rest);
        }
        let len = rest
            .char_indices()
            .find(|&(i, c)| c == '"' || c == '\\' || newline_len(&rest[i..]).is_some())
            .map_or(rest.len(), |(i, _)| i);
        (SyntaxKind::STRING_FRAGMENT, len, None)
    }

    fn scan_multiline(&mut self, rest: &str, at_line_start: bool) -> Scanned {
        if rest.starts_with("\"\"\"") {
            self.state = ScanState::Normal;
            return (SyntaxKind::TRIPLE_QUOTE, 3, None);
        }
        if rest.starts_with('\\') {
            return scan_escape(rest);
        }
        if at_line_start {
            let indent = unicode_space_len(rest);
            if indent > 0 && rest[indent..].starts_with("\"\"\"") {
                return (SyntaxKind::DEDENT, indent, None);
            }
        }
        let mut len = rest.len();
        for (i, _) in rest.char_indices() {
            let here = &rest[i..];
            if let Some(newline) = newline_len(here) {
                len = i + newline;
                break;
            }
            if i > 0 && (here.starts_with('\\') || here.starts_with("\"\"\"")) {
                len = i;
                break;
            }
        }
        (SyntaxKind::STRING_FRAGMENT, len, None)
    }

    fn scan_raw(&mut self, rest: &str, hashes: usize, multiline: bool) -> Scanned {
        let quotes = if multiline { 3 } else { 1 };
        let closes_at = |s: &str| {
            let bytes = s.as_bytes();
            bytes.len() >= quotes + hashes
                && bytes[..quotes].iter().all(|&b| b == b'"')
                && bytes[quotes..quotes + hashes].iter().all(|&b| b == b'#')
        };

        if closes_at(rest) {
            self.state = ScanState::Normal;
            return (SyntaxKind::RAW_STRING_END, quotes + hashes, None);
        }
        if !multiline && newline_len(rest).is_some() {
            self.state = ScanState::Normal;
            return self.scan_normal(rest);
        }
        let len = rest
            .char_indices()
            .skip(1)
            .find(|&(i, _)| {
                closes_at(&rest[i..]) || (!multiline && newline_len(&rest[i..]).is_some())
            })
            .map_or(rest.len(), |(i, _)| i);
        (SyntaxKind::RAW_STRING_CONTENT, len, None)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

type Scanned = (SyntaxKind, usize, Option<LexError>);

fn char_end(s: &str, mut len: usize) -> usize {
    while !s.is_char_boundary(len) {
        len += 1;
    }
    len
}

fn is_newline_char(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{85}' | '\u{C}' | '\u{2028}' | '\u{2029}')
}

fn is_unicode_space(c: char) -> bool {
    matches!(
        c,
        '\t' | ' ' | '\u{A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
    )
}

fn unicode_space_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_unicode_space(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Escape at the start of `rest`, which begins with `\`
fn scan_escape(rest: &str) -> Scanned {
    let after = &rest[1..];
    let Some(c) = after.chars().next() else {
        return (SyntaxKind::ERROR, 1, Some(LexError::InvalidEscape));
    };
    match c {
        'n' | 'r' | 't' | '\\' | '"' | 'b' | 'f' | 's' | '/' => (SyntaxKind::ESCAPE, 2, None),
        'u' => {
            let digits = after[1..]
                .strip_prefix('{')
                .map(|hex| hex.bytes().take_while(u8::is_ascii_hexdigit).count());
            match digits {
                Some(n @ 1..=6) if after[2 + n..].starts_with('}') => {
                    (SyntaxKind::ESCAPE, 1 + 2 + n + 1, None)
                }
                _ => (SyntaxKind::ERROR, 2, Some(LexError::InvalidEscape)),
            }
        }
        c if is_unicode_space(c) || is_newline_char(c) => {
            // Whitespace escape: swallow all following space and newlines
            let len = after
                .char_indices()
                .find(|&(_, c)| !is_unicode_space(c) && !is_newline_char(c))
                .map_or(after.len(), |(i, _)| i);
            (SyntaxKind::ESCAPE, 1 + len, None)
        }
        c => (SyntaxKind::ERROR, 1 + c.len_utf8(), Some(LexError::InvalidEscape)),
    }
}

/// How a `/*` comment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentEnd {
    Closed,
    Unclosed,
}

/// Scan the rest of a nested block comment after the opening `/*`
fn block_comment(lex: &mut logos::Lexer<'_, LogosToken>) -> CommentEnd {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return CommentEnd::Closed;
                }
            }
            _ => i += 1,
        }
    }
    lex.bump(bytes.len());
    CommentEnd::Unclosed
}

/// An escline must end at a newline or the end of input
fn escline(lex: &mut logos::Lexer<'_, LogosToken>) -> bool {
    lex.slice().ends_with(is_newline_char) || lex.remainder().is_empty()
}

/// Logos token enum for Normal mode - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(subpattern unicode_space = r"[\t \u{A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]")]
#[logos(subpattern newline = r"\r\n|[\r\n\u{85}\u{C}\u{2028}\u{2029}]")]
#[logos(subpattern id_char = r#"[^\\/(){};\[\]"=#\t \u{A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}\r\n\u{85}\u{C}\u{2028}\u{2029}\u{FEFF}\x00-\x08\x0E-\x1F\x7F]"#)]
#[logos(subpattern id_start = r#"[^\\/(){};\[\]"=#0-9.+\-\t \u{A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}\r\n\u{85}\u{C}\u{2028}\u{2029}\u{FEFF}\x00-\x08\x0E-\x1F\x7F]"#)]
#[logos(subpattern signed_start = r#"[^\\/(){};\[\]"=#0-9.\t \u{A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}\r\n\u{85}\u{C}\u{2028}\u{2029}\u{FEFF}\x00-\x08\x0E-\x1F\x7F]"#)]
#[logos(subpattern dotted_start = r#"[^\\/(){};\[\]"=#0-9\t \u{A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}\r\n\u{85}\u{C}\u{2028}\u{2029}\u{FEFF}\x00-\x08\x0E-\x1F\x7F]"#)]
enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"(?&unicode_space)+")]
    Whitespace,

    #[token("\u{FEFF}")]
    Bom,

    #[regex(r"//[^\r\n\u{85}\u{C}\u{2028}\u{2029}]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment(CommentEnd),

    #[regex(
        r"\\(?&unicode_space)*(//[^\r\n\u{85}\u{C}\u{2028}\u{2029}]*)?(?&newline)?",
        escline
    )]
    Escline,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[regex(r"(?&newline)")]
    Newline,

    #[token(";")]
    Semicolon,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("=")]
    Eq,

    #[token("/-")]
    Slashdash,

    // =========================================================================
    // STRING OPENERS (interiors are scanned outside logos)
    // =========================================================================
    #[token("\"")]
    Quote,

    #[token("\"\"\"")]
    TripleQuote,

    #[regex(r##"#+""##, |lex| lex.slice().len() - 1)]
    RawStart(usize),

    #[regex(r##"#+""""##, |lex| lex.slice().len() - 3)]
    RawMultilineStart(usize),

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("#true")]
    True,

    #[token("#false")]
    False,

    #[token("#null")]
    Null,

    #[token("#inf")]
    Inf,

    #[token("#-inf")]
    NegInf,

    #[token("#nan")]
    Nan,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[+\-]?[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+\-]?[0-9][0-9_]*)?")]
    Decimal,

    #[regex(r"[+\-]?0x[0-9a-fA-F][0-9a-fA-F_]*")]
    Hex,

    #[regex(r"[+\-]?0o[0-7][0-7_]*")]
    Octal,

    #[regex(r"[+\-]?0b[01][01_]*")]
    Binary,

    #[regex(
        r"(?&id_start)(?&id_char)*|[+\-]((?&signed_start)(?&id_char)*)?|[+\-]?\.((?&dotted_start)(?&id_char)*)?"
    )]
    BareIdent,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            Whitespace => SyntaxKind::WHITESPACE,
            Bom => SyntaxKind::BOM,
            LineComment => SyntaxKind::LINE_COMMENT,
            BlockComment(CommentEnd::Closed) => SyntaxKind::BLOCK_COMMENT,
            BlockComment(CommentEnd::Unclosed) => SyntaxKind::ERROR,
            Escline => SyntaxKind::ESCLINE,
            Newline => SyntaxKind::NEWLINE,
            Semicolon => SyntaxKind::SEMICOLON,
            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            Eq => SyntaxKind::EQ,
            Slashdash => SyntaxKind::SLASHDASH,
            Quote => SyntaxKind::QUOTE,
            TripleQuote => SyntaxKind::TRIPLE_QUOTE,
            RawStart(_) | RawMultilineStart(_) => SyntaxKind::RAW_STRING_START,
            True => SyntaxKind::TRUE_KW,
            False => SyntaxKind::FALSE_KW,
            Null => SyntaxKind::NULL_KW,
            Inf => SyntaxKind::INF_KW,
            NegInf => SyntaxKind::NEG_INF_KW,
            Nan => SyntaxKind::NAN_KW,
            Decimal => SyntaxKind::DECIMAL_NUMBER,
            Hex => SyntaxKind::HEX_NUMBER,
            Octal => SyntaxKind::OCTAL_NUMBER,
            Binary => SyntaxKind::BINARY_NUMBER,
            BareIdent => SyntaxKind::BARE_IDENT,
        }
    }
}
