//! LR parse tables
//!
//! A [`ParseTable`] is built once from a [`Grammar`] and is immutable
//! afterwards, so a single table is shared by every parse on every thread.
//! Conflicts never abort construction: they are settled by precedence where
//! both sides carry one, otherwise by preferring the shift (shift/reduce) or
//! the earliest rule (reduce/reduce), and recorded for inspection.

mod lalr;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::parser::SyntaxKind;
use crate::parser::grammar::{Assoc, Grammar, NonterminalId, Rule, RuleId, SymbolId, TerminalId, kdl};

use lalr::Lalr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub const START: StateId = StateId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Error,
    Shift(StateId),
    Reduce(RuleId),
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce { rule: RuleId },
    ReduceReduce { rules: Vec<RuleId> },
}

/// How a conflict was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Declared precedence and associativity decided
    Precedence,
    /// No precedence available, the shift was kept
    Shift,
    /// The rule declared first was kept
    EarliestRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub terminal: TerminalId,
    pub kind: ConflictKind,
    pub resolution: Resolution,
}

impl Conflict {
    /// Conflicts settled by declared precedence are intended by the grammar
    pub fn is_resolved(&self) -> bool {
        self.resolution == Resolution::Precedence
    }
}

#[derive(Default)]
struct Cell {
    shift: Option<StateId>,
    reduces: Vec<RuleId>,
    accept: bool,
}

/// Action and goto tables for a grammar
#[derive(Debug)]
pub struct ParseTable {
    grammar: Grammar,
    /// `states × terminals`, row-major
    actions: Vec<Action>,
    /// `states × nonterminals`, row-major
    gotos: Vec<Option<StateId>>,
    default_reductions: Vec<Option<RuleId>>,
    accessing: Vec<Option<SymbolId>>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn build(grammar: Grammar) -> ParseTable {
        let lalr = Lalr::new(&grammar);
        let automaton = lalr.automaton();
        let states = automaton.kernels.len();
        let n_terms = grammar.terminals.len();
        let n_nts = grammar.nonterminals.len();

        let mut actions = vec![Action::Error; states * n_terms];
        let mut gotos = vec![None; states * n_nts];
        let mut default_reductions = vec![None; states];
        let mut conflicts = Vec::new();

        for (state, kernel) in automaton.kernels.iter().enumerate() {
            let items = lalr.closure(kernel);
            let mut cells: BTreeMap<TerminalId, Cell> = BTreeMap::new();
            let mut completed = Vec::new();
            let mut consumes_terminal = false;

            for (item, lookahead) in &items {
                let rule = &grammar.rules[item.rule.index()];
                match rule.rhs.get(item.dot as usize) {
                    Some(&SymbolId::Terminal(t)) => {
                        consumes_terminal = true;
                        let target = automaton.transitions[state][&SymbolId::Terminal(t)];
                        cells.entry(t).or_default().shift = Some(StateId(target as u32));
                    }
                    Some(&SymbolId::Nonterminal(_)) => {}
                    None if item.rule == grammar.accept_rule => {
                        consumes_terminal = true;
                        cells.entry(TerminalId::EOI).or_default().accept = true;
                    }
                    None => {
                        completed.push(item.rule);
                        for t in lookahead.iter() {
                            cells.entry(t).or_default().reduces.push(item.rule);
                        }
                    }
                }
            }

            for (&symbol, &target) in &automaton.transitions[state] {
                if let SymbolId::Nonterminal(nt) = symbol {
                    gotos[state * n_nts + nt.index()] = Some(StateId(target as u32));
                }
            }

            for (terminal, cell) in cells {
                actions[state * n_terms + terminal.index()] =
                    resolve(&grammar, StateId(state as u32), terminal, cell, &mut conflicts);
            }

            // A state with a single possible reduction and nothing to shift
            // reduces without consulting the lookahead
            if let (false, [rule]) = (consumes_terminal, completed.as_slice()) {
                default_reductions[state] = Some(*rule);
            }
        }

        tracing::debug!(
            grammar = grammar.name,
            states,
            conflicts = conflicts.len(),
            "built LALR(1) table"
        );

        ParseTable {
            grammar,
            actions,
            gotos,
            default_reductions,
            accessing: automaton.accessing,
            conflicts,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn state_count(&self) -> usize {
        self.default_reductions.len()
    }

    pub fn action(&self, state: StateId, terminal: TerminalId) -> Action {
        self.actions[state.index() * self.grammar.terminals.len() + terminal.index()]
    }

    /// Action for a token kind; kinds the grammar never mentions are errors
    pub fn action_for(&self, state: StateId, kind: SyntaxKind) -> Action {
        match self.grammar.terminal_for(kind) {
            Some(terminal) => self.action(state, terminal),
            None => Action::Error,
        }
    }

    pub fn goto(&self, state: StateId, nonterminal: NonterminalId) -> Option<StateId> {
        self.gotos[state.index() * self.grammar.nonterminals.len() + nonterminal.index()]
    }

    pub fn default_reduction(&self, state: StateId) -> Option<RuleId> {
        self.default_reductions[state.index()]
    }

    /// Symbol on top of the stack whenever the parser is in `state`
    pub fn accessing_symbol(&self, state: StateId) -> Option<SymbolId> {
        self.accessing[state.index()]
    }

    pub fn rule(&self, rule: RuleId) -> &Rule {
        &self.grammar.rules[rule.index()]
    }

    /// Node kind a reduction by `rule` produces, `None` for hidden rules
    pub fn rule_kind(&self, rule: RuleId) -> Option<SyntaxKind> {
        self.grammar.nonterminals[self.rule(rule).lhs.index()].kind
    }

    pub fn terminal_for(&self, kind: SyntaxKind) -> Option<TerminalId> {
        self.grammar.terminal_for(kind)
    }

    pub fn nonterminal_named(&self, name: &str) -> Option<NonterminalId> {
        self.grammar.nonterminal_named(name)
    }

    /// Terminals with a non-error action in `state`, excluding `error`
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = TerminalId> + '_ {
        let n_terms = self.grammar.terminals.len();
        let row = &self.actions[state.index() * n_terms..(state.index() + 1) * n_terms];
        row.iter()
            .enumerate()
            .filter(|&(i, action)| *action != Action::Error && i != TerminalId::ERROR.index())
            .map(|(i, _)| TerminalId(i as u16))
    }

    pub fn terminal_name(&self, terminal: TerminalId) -> &'static str {
        self.grammar.terminals[terminal.index()].name
    }

    pub fn terminal_kind(&self, terminal: TerminalId) -> Option<SyntaxKind> {
        self.grammar.terminals[terminal.index()].kind
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn unresolved_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| !c.is_resolved())
    }

    /// Human-readable dump of every state's actions and gotos
    pub fn write_summary<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{} ({} states)", self.grammar, self.state_count())?;
        for state in 0..self.state_count() {
            let id = StateId(state as u32);
            write!(out, "state {state}")?;
            if let Some(symbol) = self.accessing_symbol(id) {
                write!(out, " [{}]", self.grammar.symbol_name(symbol))?;
            }
            writeln!(out)?;
            for terminal in 0..self.grammar.terminals.len() {
                let terminal = TerminalId(terminal as u16);
                match self.action(id, terminal) {
                    Action::Error => {}
                    Action::Shift(to) => {
                        writeln!(out, "  {:<20} shift {}", self.terminal_name(terminal), to.0)?
                    }
                    Action::Reduce(rule) => {
                        writeln!(out, "  {:<20} reduce {}", self.terminal_name(terminal), rule.0)?
                    }
                    Action::Accept => writeln!(out, "  {:<20} accept", self.terminal_name(terminal))?,
                }
            }
            for (nt, info) in self.grammar.nonterminals.iter().enumerate() {
                if let Some(to) = self.goto(id, NonterminalId(nt as u16)) {
                    writeln!(out, "  {:<20} goto {}", info.name, to.0)?;
                }
            }
            if let Some(rule) = self.default_reduction(id) {
                writeln!(out, "  {:<20} reduce {}", "$default", rule.0)?;
            }
        }
        for conflict in &self.conflicts {
            writeln!(
                out,
                "conflict in state {} on {}: {:?} ({:?})",
                conflict.state.0,
                self.terminal_name(conflict.terminal),
                conflict.kind,
                conflict.resolution
            )?;
        }
        Ok(())
    }
}

fn resolve(
    grammar: &Grammar,
    state: StateId,
    terminal: TerminalId,
    cell: Cell,
    conflicts: &mut Vec<Conflict>,
) -> Action {
    if cell.accept {
        return Action::Accept;
    }

    let reduce = cell.reduces.iter().min().copied();
    if cell.reduces.len() > 1 {
        tracing::warn!(
            state = state.0,
            terminal = grammar.terminals[terminal.index()].name,
            "reduce/reduce conflict"
        );
        conflicts.push(Conflict {
            state,
            terminal,
            kind: ConflictKind::ReduceReduce {
                rules: cell.reduces.clone(),
            },
            resolution: Resolution::EarliestRule,
        });
    }

    match (cell.shift, reduce) {
        (Some(to), None) => Action::Shift(to),
        (None, Some(rule)) => Action::Reduce(rule),
        (None, None) => Action::Error,
        (Some(to), Some(rule)) => {
            let rule_prec = grammar.rules[rule.index()].precedence;
            let term_prec = grammar.terminals[terminal.index()].precedence;
            let (action, resolution) = match (rule_prec, term_prec) {
                (Some(r), Some(t)) => {
                    let action = if r.level > t.level {
                        Action::Reduce(rule)
                    } else if r.level < t.level {
                        Action::Shift(to)
                    } else {
                        match t.assoc {
                            Assoc::Left => Action::Reduce(rule),
                            Assoc::Right => Action::Shift(to),
                            Assoc::NonAssoc => Action::Error,
                        }
                    };
                    (action, Resolution::Precedence)
                }
                _ => {
                    tracing::warn!(
                        state = state.0,
                        terminal = grammar.terminals[terminal.index()].name,
                        "shift/reduce conflict resolved as shift"
                    );
                    (Action::Shift(to), Resolution::Shift)
                }
            };
            conflicts.push(Conflict {
                state,
                terminal,
                kind: ConflictKind::ShiftReduce { rule },
                resolution,
            });
            action
        }
    }
}

static KDL_TABLE: LazyLock<ParseTable> = LazyLock::new(|| ParseTable::build(kdl::grammar()));

/// The shared table for KDL documents, built on first use
pub fn kdl_table() -> &'static ParseTable {
    &KDL_TABLE
}
