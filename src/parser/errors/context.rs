//! Where in the document an error happened
//!
//! The engine walks its stack from the top and stops at the innermost
//! symbol that opens one of these regions.

use crate::parser::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseContext {
    #[default]
    TopLevel,
    /// Inside `{ ... }`, between child nodes
    ChildrenBlock,
    /// After a node name
    NodeEntries,
    /// Inside `( ... )`
    TypeAnnotation,
    /// After `=`
    PropertyValue,
    /// Inside any string form
    String,
    /// After `/-`
    Slashdash,
}

impl ParseContext {
    pub const ALL: [ParseContext; 7] = [
        Self::TopLevel,
        Self::ChildrenBlock,
        Self::NodeEntries,
        Self::TypeAnnotation,
        Self::PropertyValue,
        Self::String,
        Self::Slashdash,
    ];

    /// (where, what fits here)
    fn phrases(self) -> (&'static str, &'static str) {
        match self {
            Self::TopLevel => ("at top level", "a node"),
            Self::ChildrenBlock => ("in children block", "a node or '}'"),
            Self::NodeEntries => (
                "in node entries",
                "an argument, property, children block or terminator",
            ),
            Self::TypeAnnotation => ("in type annotation", "a type name followed by ')'"),
            Self::PropertyValue => ("in property value", "a value"),
            Self::String => (
                "in string",
                "string text, an escape or the closing delimiter",
            ),
            Self::Slashdash => ("after slashdash", "a node, entry or children block"),
        }
    }

    /// Location phrase, e.g. "in type annotation"
    pub fn description(&self) -> &'static str {
        self.phrases().0
    }

    pub fn expected_description(&self) -> &'static str {
        self.phrases().1
    }

    /// Context entered by shifting `kind`, if it opens one
    pub fn opened_by(kind: SyntaxKind) -> Option<Self> {
        Some(match kind {
            SyntaxKind::L_BRACE => Self::ChildrenBlock,
            SyntaxKind::L_PAREN => Self::TypeAnnotation,
            SyntaxKind::EQ => Self::PropertyValue,
            SyntaxKind::SLASHDASH => Self::Slashdash,
            kind if kind.is_string_start() || kind.is_string_part() => Self::String,
            _ => return None,
        })
    }

    /// A fresh node may start here
    pub fn is_between_nodes(&self) -> bool {
        matches!(self, Self::TopLevel | Self::ChildrenBlock)
    }
}
