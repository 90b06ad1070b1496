//! Context-free grammar descriptions
//!
//! A grammar is plain data: terminals are token kinds, nonterminals are
//! either *named* (each reduction produces a tree node of that kind) or
//! *hidden* (their children are spliced into the enclosing node).
//! The `error` pseudo-terminal marks where panic-mode recovery may resume.
//!
//! - `kdl` - The KDL document grammar

pub mod kdl;

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::parser::SyntaxKind;
use crate::parser::syntax_kind::kind_to_name;

/// Index of a terminal column in a grammar (0 = end of input, 1 = `error`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub(crate) u16);

impl TerminalId {
    pub const EOI: TerminalId = TerminalId(0);
    pub const ERROR: TerminalId = TerminalId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonterminalId(pub(crate) u16);

impl NonterminalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) u16);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Right-hand side element of a rule as written in a grammar description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Token(SyntaxKind),
    Rule(NonterminalId),
    Error,
}

impl From<NonterminalId> for Symbol {
    fn from(id: NonterminalId) -> Self {
        Symbol::Rule(id)
    }
}

/// Resolved grammar symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolId {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Binding strength used to settle shift/reduce conflicts. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precedence {
    pub level: u16,
    pub assoc: Assoc,
}

#[derive(Debug, Clone)]
pub struct TerminalInfo {
    /// `None` for the end-of-input and `error` pseudo-terminals
    pub kind: Option<SyntaxKind>,
    pub name: &'static str,
    pub precedence: Option<Precedence>,
}

#[derive(Debug, Clone)]
pub struct NonterminalInfo {
    pub name: &'static str,
    /// Node kind produced by reductions; `None` for hidden rules
    pub kind: Option<SyntaxKind>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: NonterminalId,
    pub rhs: Vec<SymbolId>,
    pub precedence: Option<Precedence>,
}

/// Problems found by [`Grammar::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("nonterminal `{0}` is reachable but has no rules")]
    NoRules(&'static str),
    #[error("nonterminal `{0}` cannot derive any token sequence")]
    Unproductive(&'static str),
}

/// A complete grammar, augmented with `$accept := start`
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: &'static str,
    pub(crate) terminals: Vec<TerminalInfo>,
    pub(crate) terminal_of: FxHashMap<SyntaxKind, TerminalId>,
    pub(crate) nonterminals: Vec<NonterminalInfo>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) start: NonterminalId,
    pub(crate) accept_rule: RuleId,
}

impl Grammar {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn terminals(&self) -> &[TerminalInfo] {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &[NonterminalInfo] {
        &self.nonterminals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn start(&self) -> NonterminalId {
        self.start
    }

    pub fn terminal_for(&self, kind: SyntaxKind) -> Option<TerminalId> {
        self.terminal_of.get(&kind).copied()
    }

    pub fn nonterminal_named(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals
            .iter()
            .position(|nt| nt.name == name)
            .map(|i| NonterminalId(i as u16))
    }

    pub fn symbol_name(&self, symbol: SymbolId) -> &'static str {
        match symbol {
            SymbolId::Terminal(t) => self.terminals[t.index()].name,
            SymbolId::Nonterminal(n) => self.nonterminals[n.index()].name,
        }
    }

    /// Check that every nonterminal reachable from the start symbol has rules
    /// and derives at least one finite token sequence.
    pub fn validate(&self) -> Result<(), GrammarError> {
        let mut reachable = vec![false; self.nonterminals.len()];
        let mut stack = vec![self.start];
        reachable[self.start.index()] = true;
        while let Some(nt) = stack.pop() {
            let mut has_rules = false;
            for rule in self.rules.iter().filter(|r| r.lhs == nt) {
                has_rules = true;
                for &symbol in &rule.rhs {
                    let SymbolId::Nonterminal(next) = symbol else {
                        continue;
                    };
                    if !reachable[next.index()] {
                        reachable[next.index()] = true;
                        stack.push(next);
                    }
                }
            }
            if !has_rules {
                return Err(GrammarError::NoRules(self.nonterminals[nt.index()].name));
            }
        }

        let mut productive = vec![false; self.nonterminals.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if productive[rule.lhs.index()] {
                    continue;
                }
                let derives = rule.rhs.iter().all(|symbol| match symbol {
                    SymbolId::Terminal(_) => true,
                    SymbolId::Nonterminal(n) => productive[n.index()],
                });
                if derives {
                    productive[rule.lhs.index()] = true;
                    changed = true;
                }
            }
        }
        match (0..self.nonterminals.len()).find(|&i| reachable[i] && !productive[i]) {
            Some(i) => Err(GrammarError::Unproductive(self.nonterminals[i].name)),
            None => Ok(()),
        }
    }

    /// Write the rules in `lhs -> rhs` form, one per line
    pub fn write_rules<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            write!(out, "{i:>3}: {} ->", self.nonterminals[rule.lhs.index()].name)?;
            for &symbol in &rule.rhs {
                write!(out, " {}", self.symbol_name(symbol))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grammar {} ({} terminals, {} nonterminals, {} rules)",
            self.name,
            self.terminals.len(),
            self.nonterminals.len(),
            self.rules.len()
        )
    }
}

/// Incremental construction of a [`Grammar`]
pub struct GrammarBuilder {
    name: &'static str,
    terminals: Vec<TerminalInfo>,
    terminal_of: FxHashMap<SyntaxKind, TerminalId>,
    nonterminals: Vec<NonterminalInfo>,
    rules: Vec<Rule>,
    next_level: u16,
}

impl GrammarBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            terminals: vec![
                TerminalInfo {
                    kind: None,
                    name: "end of input",
                    precedence: None,
                },
                TerminalInfo {
                    kind: None,
                    name: "error",
                    precedence: None,
                },
            ],
            terminal_of: FxHashMap::default(),
            nonterminals: vec![NonterminalInfo {
                name: "$accept",
                kind: None,
            }],
            rules: Vec::new(),
            next_level: 1,
        }
    }

    /// Declare a nonterminal whose reductions produce nodes of `kind`
    pub fn named(&mut self, name: &'static str, kind: SyntaxKind) -> NonterminalId {
        self.nonterminal(name, Some(kind))
    }

    /// Declare a nonterminal whose children are spliced into the parent
    pub fn hidden(&mut self, name: &'static str) -> NonterminalId {
        self.nonterminal(name, None)
    }

    fn nonterminal(&mut self, name: &'static str, kind: Option<SyntaxKind>) -> NonterminalId {
        self.nonterminals.push(NonterminalInfo { name, kind });
        NonterminalId((self.nonterminals.len() - 1) as u16)
    }

    fn terminal(&mut self, kind: SyntaxKind) -> TerminalId {
        if let Some(&id) = self.terminal_of.get(&kind) {
            return id;
        }
        let id = TerminalId(self.terminals.len() as u16);
        self.terminals.push(TerminalInfo {
            kind: Some(kind),
            name: kind_to_name(kind),
            precedence: None,
        });
        self.terminal_of.insert(kind, id);
        id
    }

    /// Declare one precedence level, binding tighter than all earlier calls
    pub fn precedence(&mut self, assoc: Assoc, kinds: &[SyntaxKind]) -> Precedence {
        let precedence = Precedence {
            level: self.next_level,
            assoc,
        };
        self.next_level += 1;
        for &kind in kinds {
            let id = self.terminal(kind);
            self.terminals[id.index()].precedence = Some(precedence);
        }
        precedence
    }

    /// Add `lhs := rhs`. The rule takes the precedence of its last terminal.
    pub fn rule(&mut self, lhs: NonterminalId, rhs: &[Symbol]) -> RuleId {
        let rhs = self.resolve(rhs);
        let precedence = rhs.iter().rev().find_map(|symbol| match symbol {
            SymbolId::Terminal(t) => self.terminals[t.index()].precedence,
            SymbolId::Nonterminal(_) => None,
        });
        self.push_rule(lhs, rhs, precedence)
    }

    /// Add `lhs := rhs` with an explicit precedence
    pub fn rule_with_precedence(
        &mut self,
        lhs: NonterminalId,
        rhs: &[Symbol],
        precedence: Precedence,
    ) -> RuleId {
        let rhs = self.resolve(rhs);
        self.push_rule(lhs, rhs, Some(precedence))
    }

    fn resolve(&mut self, rhs: &[Symbol]) -> Vec<SymbolId> {
        rhs.iter()
            .map(|&symbol| match symbol {
                Symbol::Token(kind) => SymbolId::Terminal(self.terminal(kind)),
                Symbol::Rule(nt) => SymbolId::Nonterminal(nt),
                Symbol::Error => SymbolId::Terminal(TerminalId::ERROR),
            })
            .collect()
    }

    fn push_rule(
        &mut self,
        lhs: NonterminalId,
        rhs: Vec<SymbolId>,
        precedence: Option<Precedence>,
    ) -> RuleId {
        self.rules.push(Rule {
            lhs,
            rhs,
            precedence,
        });
        RuleId((self.rules.len() - 1) as u16)
    }

    /// Finish the grammar, adding `$accept := start` as the last rule
    pub fn build(mut self, start: NonterminalId) -> Grammar {
        let accept = NonterminalId(0);
        let accept_rule = self.push_rule(accept, vec![SymbolId::Nonterminal(start)], None);
        Grammar {
            name: self.name,
            terminals: self.terminals,
            terminal_of: self.terminal_of,
            nonterminals: self.nonterminals,
            rules: self.rules,
            start,
            accept_rule,
        }
    }
}
