//! Syntax kinds for the KDL syntax tree
//!
//! This enum defines all possible node and token kinds in the tree. Tokens
//! are leaves produced by the lexer; nodes are produced by grammar reductions.

/// All syntax kinds (tokens and nodes) in a KDL document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (preserved in the tree but never seen by the grammar)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,  // // ...
    BLOCK_COMMENT, // /* ... */, nested
    ESCLINE,       // \ followed by optional comment and a newline
    BOM,           // U+FEFF

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    NEWLINE,   // any KDL newline, terminates nodes
    SEMICOLON, // ;
    L_BRACE,   // {
    R_BRACE,   // }
    L_PAREN,   // (
    R_PAREN,   // )
    EQ,        // =
    SLASHDASH, // /-

    // =========================================================================
    // STRINGS
    // =========================================================================
    QUOTE,              // "
    TRIPLE_QUOTE,       // """
    STRING_FRAGMENT,    // literal text inside a quoted string
    ESCAPE,             // \n, \u{..}, whitespace escape
    DEDENT,             // whitespace before the closing """
    RAW_STRING_START,   // #" or #"""
    RAW_STRING_CONTENT, // everything between the raw delimiters
    RAW_STRING_END,     // "# or """#

    // =========================================================================
    // LITERALS
    // =========================================================================
    BARE_IDENT,     // node, foo-bar, -dashed
    DECIMAL_NUMBER, // 1, -2.5e10
    HEX_NUMBER,     // 0xdead_beef
    OCTAL_NUMBER,   // 0o755
    BINARY_NUMBER,  // 0b1010

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    TRUE_KW,    // #true
    FALSE_KW,   // #false
    NULL_KW,    // #null
    INF_KW,     // #inf
    NEG_INF_KW, // #-inf
    NAN_KW,     // #nan

    // =========================================================================
    // NODES
    // =========================================================================
    DOCUMENT,
    NODE,
    VERSION, // top-level `/- kdl-version 2`
    IDENTIFIER,
    TYPE,
    ARGUMENT,
    PROPERTY,
    CHILDREN,
    STRING,
    NUMBER,
    KEYWORD,

    // Special: unrecognized input (token) or recovered region (node)
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace, comment, escline, BOM)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT | Self::ESCLINE | Self::BOM
        )
    }

    /// Check if this kind is produced by the lexer. `ERROR` counts as both.
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::NAN_KW as u16) || self == Self::ERROR
    }

    /// Check if this kind is produced by a grammar reduction
    pub fn is_node(self) -> bool {
        (self as u16) >= (Self::DOCUMENT as u16) && (self as u16) <= (Self::ERROR as u16)
    }

    /// Check if this is a keyword (`#true`, `#nan`, ...)
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::TRUE_KW as u16) && (self as u16) <= (Self::NAN_KW as u16)
    }

    /// Check if this is a number literal token
    pub fn is_number(self) -> bool {
        matches!(
            self,
            Self::DECIMAL_NUMBER | Self::HEX_NUMBER | Self::OCTAL_NUMBER | Self::BINARY_NUMBER
        )
    }

    /// Check if this token only appears inside a string
    pub fn is_string_part(self) -> bool {
        matches!(
            self,
            Self::STRING_FRAGMENT | Self::ESCAPE | Self::DEDENT | Self::RAW_STRING_CONTENT
        )
    }

    /// Check if this token opens a string
    pub fn is_string_start(self) -> bool {
        matches!(self, Self::QUOTE | Self::TRIPLE_QUOTE | Self::RAW_STRING_START)
    }

    /// Node kinds that a leading `/-` comments out
    pub fn can_be_slashdashed(self) -> bool {
        matches!(
            self,
            Self::NODE | Self::VERSION | Self::ARGUMENT | Self::PROPERTY | Self::CHILDREN
        )
    }

    /// Name used in s-expression dumps (`(node (identifier))`)
    pub fn sexp_name(self) -> &'static str {
        match self {
            Self::DOCUMENT => "document",
            Self::NODE => "node",
            Self::VERSION => "version",
            Self::IDENTIFIER => "identifier",
            Self::TYPE => "type",
            Self::ARGUMENT => "argument",
            Self::PROPERTY => "property",
            Self::CHILDREN => "children",
            Self::STRING => "string",
            Self::NUMBER => "number",
            Self::KEYWORD => "keyword",
            Self::ERROR => "ERROR",
            _ => kind_to_name(self),
        }
    }
}

/// Human-readable token name for error messages
pub fn kind_to_name(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::WHITESPACE => "whitespace",
        SyntaxKind::LINE_COMMENT => "line comment",
        SyntaxKind::BLOCK_COMMENT => "block comment",
        SyntaxKind::ESCLINE => "line continuation",
        SyntaxKind::BOM => "byte order mark",
        SyntaxKind::NEWLINE => "newline",
        SyntaxKind::SEMICOLON => "';'",
        SyntaxKind::L_BRACE => "'{'",
        SyntaxKind::R_BRACE => "'}'",
        SyntaxKind::L_PAREN => "'('",
        SyntaxKind::R_PAREN => "')'",
        SyntaxKind::EQ => "'='",
        SyntaxKind::SLASHDASH => "'/-'",
        SyntaxKind::QUOTE => "'\"'",
        SyntaxKind::TRIPLE_QUOTE => "'\"\"\"'",
        SyntaxKind::STRING_FRAGMENT => "string text",
        SyntaxKind::ESCAPE => "escape sequence",
        SyntaxKind::DEDENT => "string indentation",
        SyntaxKind::RAW_STRING_START => "raw string",
        SyntaxKind::RAW_STRING_CONTENT => "raw string text",
        SyntaxKind::RAW_STRING_END => "raw string delimiter",
        SyntaxKind::BARE_IDENT => "identifier",
        SyntaxKind::DECIMAL_NUMBER
        | SyntaxKind::HEX_NUMBER
        | SyntaxKind::OCTAL_NUMBER
        | SyntaxKind::BINARY_NUMBER => "number",
        SyntaxKind::TRUE_KW => "'#true'",
        SyntaxKind::FALSE_KW => "'#false'",
        SyntaxKind::NULL_KW => "'#null'",
        SyntaxKind::INF_KW => "'#inf'",
        SyntaxKind::NEG_INF_KW => "'#-inf'",
        SyntaxKind::NAN_KW => "'#nan'",
        SyntaxKind::DOCUMENT => "document",
        SyntaxKind::NODE => "node",
        SyntaxKind::VERSION => "version marker",
        SyntaxKind::IDENTIFIER => "name",
        SyntaxKind::TYPE => "type annotation",
        SyntaxKind::ARGUMENT => "argument",
        SyntaxKind::PROPERTY => "property",
        SyntaxKind::CHILDREN => "children block",
        SyntaxKind::STRING => "string",
        SyntaxKind::NUMBER => "number",
        SyntaxKind::KEYWORD => "keyword",
        SyntaxKind::ERROR => "invalid input",
        SyntaxKind::__LAST => "unknown",
    }
}
