//! LALR(1) automaton construction
//!
//! States are LR(1) kernels keyed by their LR(0) core. When a goto reaches an
//! existing core the lookaheads are merged into it and the state is queued
//! again, so the fixed point is the LALR(1) automaton without ever building
//! the canonical LR(1) collection.

use std::collections::{BTreeMap, VecDeque};

use indexmap::IndexMap;

use crate::parser::grammar::{Grammar, RuleId, SymbolId, TerminalId};

/// An LR(0) item: a rule and how much of its right-hand side has been seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
    pub rule: RuleId,
    pub dot: u16,
}

/// Fixed-width set of terminals
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TermSet {
    words: Vec<u64>,
}

impl TermSet {
    pub fn empty(terminals: usize) -> Self {
        Self {
            words: vec![0; terminals.div_ceil(64)],
        }
    }

    pub fn insert(&mut self, t: TerminalId) -> bool {
        let (word, bit) = (t.index() / 64, 1u64 << (t.index() % 64));
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    #[cfg(test)]
    pub fn contains(&self, t: TerminalId) -> bool {
        self.words[t.index() / 64] & (1u64 << (t.index() % 64)) != 0
    }

    /// Add every member of `other`; true if anything was new
    pub fn union_with(&mut self, other: &TermSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn is_subset(&self, other: &TermSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(mine, theirs)| mine & !theirs == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| TerminalId((w * 64 + bit) as u16))
        })
    }
}

/// Items with their lookahead sets
pub(crate) type ItemSet = BTreeMap<Item, TermSet>;

pub(crate) struct Automaton {
    pub kernels: Vec<ItemSet>,
    pub transitions: Vec<BTreeMap<SymbolId, usize>>,
    /// Symbol shifted or reduced to enter each state
    pub accessing: Vec<Option<SymbolId>>,
}

/// Grammar plus the derived data the construction needs
pub(crate) struct Lalr<'g> {
    grammar: &'g Grammar,
    rules_by_lhs: Vec<Vec<RuleId>>,
    first: Vec<TermSet>,
    nullable: Vec<bool>,
}

impl<'g> Lalr<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        let mut rules_by_lhs = vec![Vec::new(); grammar.nonterminals.len()];
        for (i, rule) in grammar.rules.iter().enumerate() {
            rules_by_lhs[rule.lhs.index()].push(RuleId(i as u16));
        }
        let mut lalr = Self {
            grammar,
            rules_by_lhs,
            first: vec![TermSet::empty(grammar.terminals.len()); grammar.nonterminals.len()],
            nullable: vec![false; grammar.nonterminals.len()],
        };
        lalr.compute_first_sets();
        lalr
    }

    fn empty_set(&self) -> TermSet {
        TermSet::empty(self.grammar.terminals.len())
    }

    fn compute_first_sets(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.grammar.rules {
                let lhs = rule.lhs.index();
                let mut all_nullable = true;
                for &symbol in &rule.rhs {
                    match symbol {
                        SymbolId::Terminal(t) => {
                            changed |= self.first[lhs].insert(t);
                            all_nullable = false;
                        }
                        SymbolId::Nonterminal(n) => {
                            let first_n = self.first[n.index()].clone();
                            changed |= self.first[lhs].union_with(&first_n);
                            all_nullable = self.nullable[n.index()];
                        }
                    }
                    if !all_nullable {
                        break;
                    }
                }
                if all_nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
            }
        }
    }

    /// FIRST(sequence · lookahead)
    fn first_of(&self, sequence: &[SymbolId], lookahead: &TermSet) -> TermSet {
        let mut result = self.empty_set();
        for &symbol in sequence {
            match symbol {
                SymbolId::Terminal(t) => {
                    result.insert(t);
                    return result;
                }
                SymbolId::Nonterminal(n) => {
                    result.union_with(&self.first[n.index()]);
                    if !self.nullable[n.index()] {
                        return result;
                    }
                }
            }
        }
        result.union_with(lookahead);
        result
    }

    /// LR(1) closure of a kernel
    pub fn closure(&self, kernel: &ItemSet) -> ItemSet {
        let mut items = kernel.clone();
        let mut work: Vec<Item> = items.keys().copied().collect();
        while let Some(item) = work.pop() {
            let rule = &self.grammar.rules[item.rule.index()];
            let Some(&SymbolId::Nonterminal(next)) = rule.rhs.get(item.dot as usize) else {
                continue;
            };
            let lookahead = self.first_of(&rule.rhs[item.dot as usize + 1..], &items[&item]);
            for &rule in &self.rules_by_lhs[next.index()] {
                let start = Item { rule, dot: 0 };
                let entry = items.entry(start).or_insert_with(|| self.empty_set());
                if !lookahead.is_subset(entry) {
                    entry.union_with(&lookahead);
                    work.push(start);
                }
            }
        }
        items
    }

    pub fn automaton(&self) -> Automaton {
        let mut start = self.empty_set();
        start.insert(TerminalId::EOI);
        let mut kernels: IndexMap<Vec<Item>, ItemSet> = IndexMap::new();
        let initial = Item {
            rule: self.grammar.accept_rule,
            dot: 0,
        };
        kernels.insert(vec![initial], ItemSet::from([(initial, start)]));

        let mut transitions = vec![BTreeMap::new()];
        let mut accessing = vec![None];
        let mut queued = vec![true];
        let mut work = VecDeque::from([0usize]);

        while let Some(state) = work.pop_front() {
            queued[state] = false;
            let items = self.closure(&kernels[state]);

            let mut moves: BTreeMap<SymbolId, ItemSet> = BTreeMap::new();
            for (item, lookahead) in &items {
                let rule = &self.grammar.rules[item.rule.index()];
                if let Some(&symbol) = rule.rhs.get(item.dot as usize) {
                    let advanced = Item {
                        rule: item.rule,
                        dot: item.dot + 1,
                    };
                    moves
                        .entry(symbol)
                        .or_default()
                        .entry(advanced)
                        .or_insert_with(|| self.empty_set())
                        .union_with(lookahead);
                }
            }

            for (symbol, kernel) in moves {
                let core: Vec<Item> = kernel.keys().copied().collect();
                let target = match kernels.get_index_of(&core) {
                    Some(existing) => {
                        let mut grew = false;
                        for (item, lookahead) in &kernel {
                            if let Some(current) = kernels[existing].get_mut(item) {
                                grew |= current.union_with(lookahead);
                            }
                        }
                        if grew && !queued[existing] {
                            queued[existing] = true;
                            work.push_back(existing);
                        }
                        existing
                    }
                    None => {
                        let (index, _) = kernels.insert_full(core, kernel);
                        transitions.push(BTreeMap::new());
                        accessing.push(Some(symbol));
                        queued.push(true);
                        work.push_back(index);
                        index
                    }
                };
                transitions[state].insert(symbol, target);
            }
        }

        Automaton {
            kernels: kernels.into_values().collect(),
            transitions,
            accessing,
        }
    }
}
