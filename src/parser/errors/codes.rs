//! Diagnostic codes
//!
//! A code is `E` followed by two category digits and two sequence digits:
//! `01` lexical, `02` delimiters and terminators, `03` node shape, `09` the
//! catch-all the engine falls back to.

use std::fmt;

use super::error::Severity;
use crate::parser::lexer::LexError;

macro_rules! error_codes {
    ($($code:ident => $message:literal, $doc:literal;)*) => {
        /// Stable identifier of a diagnostic, independent of its message text
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ErrorCode {
            $(#[doc = $doc] $code,)*
        }

        impl ErrorCode {
            /// Every code, in numeric order
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$code),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$code => stringify!($code),)*
                }
            }

            /// Message used when the engine has nothing more specific to say
            pub fn default_message(&self) -> &'static str {
                match self {
                    $(Self::$code => $message,)*
                }
            }
        }
    };
}

error_codes! {
    E0101 => "invalid character", "A character no token can start with";
    E0102 => "unterminated string literal", "Quoted, multi-line or raw string missing its closing delimiter";
    E0103 => "unterminated block comment", "`/*` without a matching `*/`";
    E0104 => "invalid escape sequence", "Unknown `\\` escape or malformed `\\u{...}`";
    E0105 => "line continuation must be followed by a newline", "`\\` with something other than a comment before the line end";
    E0201 => "missing node terminator", "Node not followed by a newline, `;` or `}`";
    E0202 => "unclosed brace", "`{` never closed";
    E0203 => "unclosed parenthesis", "`(` never closed";
    E0204 => "unexpected closing brace", "`}` with no open children block";
    E0301 => "missing node name", "Entries or a children block with no name in front";
    E0302 => "entry after children block", "Argument or property following `{ ... }`";
    E0303 => "missing property value", "`=` with no value after it";
    E0304 => "invalid type annotation", "`( ... )` holding something other than one string";
    E0305 => "slashdash without a target", "`/-` with nothing after it to comment out";
    E0901 => "unexpected token", "Token that fits nowhere at this point";
    E0902 => "expected token", "Token the grammar required was inserted as missing";
    E0999 => "internal parser error", "Parser invariant broken; recovered by discarding input";
}

impl ErrorCode {
    fn category(&self) -> u8 {
        // "E0" prefix, then the category digit
        self.as_str().as_bytes()[2] - b'0'
    }

    pub fn category_description(&self) -> &'static str {
        match self.category() {
            1 => "lexical error",
            2 => "structural error",
            3 => "node error",
            _ => "syntax error",
        }
    }

    /// Braces, parentheses and node terminators
    pub fn is_structural(&self) -> bool {
        self.category() == 2
    }

    pub fn is_lexical(&self) -> bool {
        self.category() == 1
    }

    /// A dangling `/-` comments out nothing, so the document still means
    /// what it says
    pub fn severity(&self) -> Severity {
        match self {
            Self::E0305 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl From<&LexError> for ErrorCode {
    fn from(error: &LexError) -> Self {
        match error {
            LexError::UnrecognizedCharacter => Self::E0101,
            LexError::UnterminatedComment => Self::E0103,
            LexError::InvalidEscape => Self::E0104,
            LexError::DanglingEscline => Self::E0105,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
