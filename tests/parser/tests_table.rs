//! Parse table construction through the public grammar API

use kdl_sitter::SyntaxKind;
use kdl_sitter::parser::grammar::{GrammarBuilder, Symbol, kdl};
use kdl_sitter::parser::table::{Action, ParseTable, StateId};
use kdl_sitter::parser::{kdl_table, kind_to_name};

fn t(kind: SyntaxKind) -> Symbol {
    Symbol::Token(kind)
}

/// Follow shifts (and the gotos after default reductions) for `kinds`
fn walk(table: &ParseTable, kinds: &[SyntaxKind]) -> Vec<StateId> {
    let mut stack = vec![StateId::START];
    for &kind in kinds {
        loop {
            let top = *stack.last().unwrap();
            let action = match table.default_reduction(top) {
                Some(rule) => Action::Reduce(rule),
                None => table.action_for(top, kind),
            };
            match action {
                Action::Shift(to) => {
                    stack.push(to);
                    break;
                }
                Action::Reduce(rule) => {
                    let rule = table.rule(rule);
                    stack.truncate(stack.len() - rule.rhs.len());
                    let top = *stack.last().unwrap();
                    stack.push(table.goto(top, rule.lhs).unwrap());
                }
                other => panic!("{kind:?} hit {other:?}"),
            }
        }
    }
    stack
}

fn expected_after(table: &ParseTable, kinds: &[SyntaxKind]) -> Vec<&'static str> {
    let stack = walk(table, kinds);
    let top = *stack.last().unwrap();
    let mut names: Vec<_> = table.expected(top).map(|t| table.terminal_name(t)).collect();
    names.sort_unstable();
    names
}

#[test]
fn test_kdl_table_has_no_unresolved_conflicts() {
    let table = kdl_table();
    assert_eq!(table.unresolved_conflicts().count(), 0);
    assert!(table.grammar().validate().is_ok());
    assert!(table.state_count() > 10);
}

#[test]
fn test_kdl_table_is_built_once() {
    assert!(std::ptr::eq(kdl_table(), kdl_table()));
}

#[test]
fn test_expected_after_property_equals_is_a_value() {
    let table = kdl_table();
    let expected = expected_after(
        table,
        &[SyntaxKind::BARE_IDENT, SyntaxKind::BARE_IDENT, SyntaxKind::EQ],
    );
    for value in [
        SyntaxKind::DECIMAL_NUMBER,
        SyntaxKind::BARE_IDENT,
        SyntaxKind::QUOTE,
        SyntaxKind::TRUE_KW,
        SyntaxKind::L_PAREN,
    ] {
        assert!(expected.contains(&kind_to_name(value)), "{expected:?}");
    }
    assert!(!expected.contains(&kind_to_name(SyntaxKind::NEWLINE)));
    assert!(!expected.contains(&kind_to_name(SyntaxKind::L_BRACE)));
}

#[test]
fn test_expected_inside_quoted_string() {
    let table = kdl_table();
    let expected = expected_after(table, &[SyntaxKind::BARE_IDENT, SyntaxKind::QUOTE]);
    for kind in [SyntaxKind::STRING_FRAGMENT, SyntaxKind::ESCAPE, SyntaxKind::QUOTE] {
        assert!(expected.contains(&kind_to_name(kind)), "{expected:?}");
    }
    assert!(!expected.contains(&kind_to_name(SyntaxKind::NEWLINE)));
}

#[test]
fn test_every_insertable_token_closes_something() {
    let table = kdl_table();
    for &kind in kdl::INSERTABLE {
        assert!(table.terminal_for(kind).is_some(), "{kind:?}");
    }
    // The reusable node nonterminal is reachable from the start state
    let node = table.nonterminal_named(kdl::REUSABLE_NODE).unwrap();
    let lines = walk(table, &[SyntaxKind::NEWLINE]);
    assert!(table.goto(lines[lines.len() - 2], node).is_some());
}

#[test]
fn test_summary_lists_states_and_rules() {
    let table = kdl_table();
    let mut summary = Vec::new();
    table.write_summary(&mut summary).unwrap();
    let summary = String::from_utf8(summary).unwrap();
    assert!(summary.starts_with("grammar kdl ("));
    assert!(summary.contains("state 0"));
    assert!(summary.contains(&format!("state {}", table.state_count() - 1)));
    assert!(!summary.contains("conflict in state"));

    let mut rules = Vec::new();
    table.grammar().write_rules(&mut rules).unwrap();
    let rules = String::from_utf8(rules).unwrap();
    assert!(rules.contains("node -> _node_body _terminator"));
    assert_eq!(rules.lines().count(), table.grammar().rules().len());
}

#[test]
fn test_custom_grammar_drives_the_same_table_builder() {
    // list := ( items ) ; items := items NUMBER | ε
    let mut g = GrammarBuilder::new("list");
    let list = g.named("list", SyntaxKind::CHILDREN);
    let items = g.hidden("items");
    g.rule(list, &[t(SyntaxKind::L_PAREN), items.into(), t(SyntaxKind::R_PAREN)]);
    g.rule(items, &[items.into(), t(SyntaxKind::DECIMAL_NUMBER)]);
    g.rule(items, &[]);
    let table = ParseTable::build(g.build(list));

    assert!(table.conflicts().is_empty());
    let stack = walk(
        &table,
        &[
            SyntaxKind::L_PAREN,
            SyntaxKind::DECIMAL_NUMBER,
            SyntaxKind::DECIMAL_NUMBER,
            SyntaxKind::R_PAREN,
        ],
    );
    assert_eq!(stack.len(), 4);
    // Tokens outside the grammar are always errors
    assert_eq!(
        table.action_for(StateId::START, SyntaxKind::BARE_IDENT),
        Action::Error
    );
}
