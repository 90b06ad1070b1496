//! The KDL document grammar
//!
//! Hidden rules (leading underscore) only group symbols; their children end
//! up in the nearest named ancestor, so the tree shape is:
//!
//! ```text
//! document
//!   node            name entries children? terminator
//!     identifier    bare identifier or string
//!     type          ( name )
//!     argument      /-? type? value
//!     property      /-? name = type? value
//!     children      /-? { nodes }
//! ```
//!
//! A top-level node spelled exactly `/- kdl-version 1` or `/- kdl-version 2`
//! and ended by a newline is labelled `version` instead of `node` when it is
//! reduced; see [`is_version_marker`].
//!
//! The final node of a document or children block may omit its terminator.
//! Such nodes come from `last_node` and are never reused across re-parses
//! because their extent depends on what follows.

use super::{Grammar, GrammarBuilder, Symbol};
use crate::parser::SyntaxKind::{self, *};

/// Name of the nonterminal whose subtrees can be reused by incremental parsing
pub const REUSABLE_NODE: &str = "node";

/// Hidden rules whose presence on the parse stack locates an error
pub const NODE_HEAD: &str = "_node_head";
pub const WITH_ENTRIES: &str = "_with_entries";
pub const WITH_CHILDREN: &str = "_with_children";
pub const SLASHDASH_PREFIX: &str = "_slashdash";

/// Tokens the parser may synthesise when they are the only thing missing
pub const INSERTABLE: &[SyntaxKind] = &[QUOTE, TRIPLE_QUOTE, RAW_STRING_END, R_PAREN, R_BRACE];

/// Whether the children of a node, as (kind, text) pairs, spell a version
/// marker. Trivia is ignored.
pub fn is_version_marker<'s>(children: impl IntoIterator<Item = (SyntaxKind, &'s str)>) -> bool {
    let mut significant = children.into_iter().filter(|(kind, _)| !kind.is_trivia());
    matches!(significant.next(), Some((SLASHDASH, _)))
        && matches!(significant.next(), Some((IDENTIFIER, "kdl-version")))
        && matches!(significant.next(), Some((ARGUMENT, "1" | "2")))
        && matches!(significant.next(), Some((NEWLINE, _)))
        && significant.next().is_none()
}

fn t(kind: SyntaxKind) -> Symbol {
    Symbol::Token(kind)
}

const ERR: Symbol = Symbol::Error;

pub fn grammar() -> Grammar {
    let mut g = GrammarBuilder::new("kdl");

    let document = g.hidden("document");
    let lines = g.hidden("_lines");
    let node = g.named(REUSABLE_NODE, NODE);
    let last_node = g.named("last_node", NODE);
    let terminator = g.hidden("_terminator");
    let node_body = g.hidden("_node_body");
    let node_head = g.hidden(NODE_HEAD);
    let with_entries = g.hidden(WITH_ENTRIES);
    let with_children = g.hidden(WITH_CHILDREN);
    let slashdash = g.hidden(SLASHDASH_PREFIX);
    let children = g.named("children", CHILDREN);
    let argument = g.named("argument", ARGUMENT);
    let property = g.named("property", PROPERTY);
    let value_typed = g.hidden("_value_typed");
    let value = g.hidden("_value");
    let type_annotation = g.named("type", TYPE);
    let name = g.named("name", IDENTIFIER);
    let bare_value = g.named("bare_value", IDENTIFIER);
    let number = g.named("number", NUMBER);
    let keyword = g.named("keyword", KEYWORD);
    let string = g.named("string", STRING);
    let quoted_parts = g.hidden("_quoted_parts");
    let quoted_part = g.hidden("_quoted_part");
    let ml_parts = g.hidden("_ml_parts");
    let ml_part = g.hidden("_ml_part");

    // document := _lines last_node?
    g.rule(document, &[lines.into()]);
    g.rule(document, &[lines.into(), last_node.into()]);

    // Blank lines, complete nodes and recovered garbage, in any order
    g.rule(lines, &[]);
    g.rule(lines, &[lines.into(), t(NEWLINE)]);
    g.rule(lines, &[lines.into(), node.into()]);
    g.rule(lines, &[lines.into(), ERR]);

    g.rule(node, &[node_body.into(), terminator.into()]);
    g.rule(last_node, &[node_body.into()]);
    g.rule(terminator, &[t(NEWLINE)]);
    g.rule(terminator, &[t(SEMICOLON)]);

    g.rule(node_body, &[with_entries.into()]);
    g.rule(node_body, &[with_children.into()]);

    g.rule(node_head, &[name.into()]);
    g.rule(node_head, &[type_annotation.into(), name.into()]);
    g.rule(node_head, &[slashdash.into(), name.into()]);
    g.rule(node_head, &[slashdash.into(), type_annotation.into(), name.into()]);

    // Entries come before any children block
    g.rule(with_entries, &[node_head.into()]);
    g.rule(with_entries, &[with_entries.into(), argument.into()]);
    g.rule(with_entries, &[with_entries.into(), property.into()]);
    g.rule(with_entries, &[with_entries.into(), ERR]);
    g.rule(with_children, &[with_entries.into(), children.into()]);
    g.rule(with_children, &[with_children.into(), children.into()]);
    g.rule(with_children, &[with_children.into(), ERR]);

    // Line space is allowed between `/-` and what it comments out
    g.rule(slashdash, &[t(SLASHDASH)]);
    g.rule(slashdash, &[slashdash.into(), t(NEWLINE)]);

    g.rule(children, &[t(L_BRACE), lines.into(), t(R_BRACE)]);
    g.rule(children, &[t(L_BRACE), lines.into(), last_node.into(), t(R_BRACE)]);
    g.rule(children, &[slashdash.into(), t(L_BRACE), lines.into(), t(R_BRACE)]);
    g.rule(
        children,
        &[slashdash.into(), t(L_BRACE), lines.into(), last_node.into(), t(R_BRACE)],
    );

    g.rule(argument, &[value_typed.into()]);
    g.rule(argument, &[slashdash.into(), value_typed.into()]);
    g.rule(property, &[name.into(), t(EQ), value_typed.into()]);
    g.rule(property, &[slashdash.into(), name.into(), t(EQ), value_typed.into()]);

    g.rule(value_typed, &[value.into()]);
    g.rule(value_typed, &[type_annotation.into(), value.into()]);
    g.rule(value, &[string.into()]);
    g.rule(value, &[number.into()]);
    g.rule(value, &[keyword.into()]);
    g.rule(value, &[bare_value.into()]);

    g.rule(type_annotation, &[t(L_PAREN), name.into(), t(R_PAREN)]);

    g.rule(name, &[t(BARE_IDENT)]);
    g.rule(name, &[string.into()]);
    g.rule(bare_value, &[t(BARE_IDENT)]);

    for kind in [DECIMAL_NUMBER, HEX_NUMBER, OCTAL_NUMBER, BINARY_NUMBER] {
        g.rule(number, &[t(kind)]);
    }
    for kind in [TRUE_KW, FALSE_KW, NULL_KW, INF_KW, NEG_INF_KW, NAN_KW] {
        g.rule(keyword, &[t(kind)]);
    }

    g.rule(string, &[t(QUOTE), t(QUOTE)]);
    g.rule(string, &[t(QUOTE), quoted_parts.into(), t(QUOTE)]);
    g.rule(string, &[t(TRIPLE_QUOTE), t(TRIPLE_QUOTE)]);
    g.rule(string, &[t(TRIPLE_QUOTE), ml_parts.into(), t(TRIPLE_QUOTE)]);
    g.rule(string, &[t(RAW_STRING_START), t(RAW_STRING_END)]);
    g.rule(string, &[t(RAW_STRING_START), t(RAW_STRING_CONTENT), t(RAW_STRING_END)]);

    g.rule(quoted_parts, &[quoted_part.into()]);
    g.rule(quoted_parts, &[quoted_parts.into(), quoted_part.into()]);
    g.rule(quoted_part, &[t(STRING_FRAGMENT)]);
    g.rule(quoted_part, &[t(ESCAPE)]);
    g.rule(quoted_part, &[ERR]);

    g.rule(ml_parts, &[ml_part.into()]);
    g.rule(ml_parts, &[ml_parts.into(), ml_part.into()]);
    g.rule(ml_part, &[t(STRING_FRAGMENT)]);
    g.rule(ml_part, &[t(ESCAPE)]);
    g.rule(ml_part, &[t(DEDENT)]);
    g.rule(ml_part, &[ERR]);

    g.build(document)
}
