//! Table-driven shift-reduce parsing
//!
//! The engine pulls tokens from the [`Lexer`] one at a time and drives an LR
//! automaton over a [`ParseTable`]. Each stack frame records how many tree
//! elements its symbol contributed, so a reduction knows exactly which
//! elements become the children of the new node.
//!
//! Trivia never reaches the automaton. It is buffered and placed in front of
//! the next shifted token; reductions of named rules move leading trivia out
//! of the node so that node ranges start at their first significant token.
//!
//! On a syntax error the engine first closes constructs left open at the end
//! of input (or before a closer of an enclosing construct), then tries to
//! insert one missing closing token, then falls back to panic mode on the
//! `error` pseudo-terminal. Recovery simulations read the live stack and
//! never copy it.

use crate::base::{TextRange, TextSize, addressable};
use crate::incremental::ReusePlan;
use crate::parser::SyntaxKind;
use crate::parser::errors::{ErrorCode, ParseContext, RelatedInfo, SyntaxError};
use crate::parser::grammar::{NonterminalId, RuleId, SymbolId, TerminalId, kdl};
use crate::parser::lexer::{Lexer, Token};
use crate::parser::options::ParseOptions;
use crate::parser::syntax_kind::kind_to_name;
use crate::parser::table::{Action, ParseTable, StateId, kdl_table};
use crate::syntax::{NodeId, ParseStats, Tree, TreeBuilder};

/// Parse a KDL document with default options
pub fn parse(text: &str) -> Tree {
    parse_with_options(text, &ParseOptions::default())
}

/// Text past [`MAX_TEXT_LEN`](crate::base::MAX_TEXT_LEN) bytes is left out
/// of the tree.
pub fn parse_with_options(text: &str, options: &ParseOptions) -> Tree {
    Engine::new(kdl_table(), input(text), options, None).run()
}

pub(crate) fn parse_reusing(text: &str, options: &ParseOptions, plan: &ReusePlan<'_>) -> Tree {
    Engine::new(kdl_table(), input(text), options, Some(plan)).run()
}

fn input(text: &str) -> &str {
    let kept = addressable(text);
    if kept.len() < text.len() {
        tracing::warn!(len = text.len(), kept = kept.len(), "text exceeds u32 offsets, parsing its prefix");
    }
    kept
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    state: StateId,
    /// Tree elements pushed for this frame's symbol
    elements: usize,
}

/// The current lookahead
#[derive(Debug, Clone, Copy)]
enum La {
    Token(Token),
    /// A subtree copied from the previous tree, standing in for its tokens
    Reused { id: NodeId, first: SyntaxKind },
    Eoi,
}

/// Nonterminals the engine looks for on its stack
struct Landmarks {
    node: Option<NonterminalId>,
    head: Option<NonterminalId>,
    entries: Option<NonterminalId>,
    after_children: Option<NonterminalId>,
    slashdash: Option<NonterminalId>,
}

impl Landmarks {
    fn new(table: &ParseTable) -> Self {
        Self {
            node: table.nonterminal_named(kdl::REUSABLE_NODE),
            head: table.nonterminal_named(kdl::NODE_HEAD),
            entries: table.nonterminal_named(kdl::WITH_ENTRIES),
            after_children: table.nonterminal_named(kdl::WITH_CHILDREN),
            slashdash: table.nonterminal_named(kdl::SLASHDASH_PREFIX),
        }
    }
}

struct Engine<'a> {
    table: &'a ParseTable,
    text: &'a str,
    options: &'a ParseOptions,
    lexer: Lexer<'a>,
    builder: TreeBuilder,
    stack: Vec<Frame>,
    elements: Vec<NodeId>,
    /// Trivia lexed since the last consumed token
    pending: Vec<NodeId>,
    la: Option<La>,
    diagnostics: Vec<SyntaxError>,
    stats: ParseStats,
    reuse: Option<&'a ReusePlan<'a>>,
    landmarks: Landmarks,
    /// (offset, count) of missing tokens inserted at one lookahead
    insertions: (TextSize, usize),
    /// (offset, count) of recoveries attempted at one lookahead
    recoveries: (TextSize, usize),
    /// (offset, remaining) closers that may still be inserted at one
    /// lookahead without touching the other budgets
    closings: (TextSize, usize),
    /// Frames on the stack whose symbol is each of [`OPENERS`]
    open: [usize; OPENERS.len()],
}

impl<'a> Engine<'a> {
    fn new(
        table: &'a ParseTable,
        text: &'a str,
        options: &'a ParseOptions,
        reuse: Option<&'a ReusePlan<'a>>,
    ) -> Self {
        Self {
            table,
            text,
            options,
            lexer: Lexer::new(text),
            builder: TreeBuilder::new(),
            stack: vec![Frame {
                state: StateId::START,
                elements: 0,
            }],
            elements: Vec::new(),
            pending: Vec::new(),
            la: None,
            diagnostics: Vec::new(),
            stats: ParseStats::default(),
            reuse,
            landmarks: Landmarks::new(table),
            insertions: (TextSize::new(0), 0),
            recoveries: (TextSize::new(0), 0),
            closings: (TextSize::new(0), 0),
            open: [0; OPENERS.len()],
        }
    }

    fn run(mut self) -> Tree {
        let table = self.table;
        loop {
            let top = self.top();
            if let Some(rule) = table.default_reduction(top) {
                if !self.reduce(rule) {
                    return self.internal_error();
                }
                continue;
            }

            let la = match self.la {
                Some(la) => la,
                None => {
                    let la = self.fetch(true);
                    self.la = Some(la);
                    la
                }
            };

            let action = match self.terminal(&la) {
                Some(terminal) => table.action(top, terminal),
                None => Action::Error,
            };
            match action {
                Action::Shift(to) => self.shift(la, to),
                Action::Reduce(rule) => {
                    if !self.reduce(rule) {
                        return self.internal_error();
                    }
                }
                Action::Accept => return self.finish(),
                Action::Error => {
                    if !self.recover(la) {
                        return self.fallback();
                    }
                }
            }
        }
    }

    fn top(&self) -> StateId {
        self.stack.last().map_or(StateId::START, |f| f.state)
    }

    fn push_frame(&mut self, frame: Frame) {
        if let Some(slot) = self.accessing_kind(&frame).and_then(opener_slot) {
            self.open[slot] += 1;
        }
        self.stack.push(frame);
    }

    /// Pop every frame above the first `keep`
    fn pop_frames(&mut self, keep: usize) -> Vec<Frame> {
        let popped = self.stack.split_off(keep.min(self.stack.len()));
        for frame in &popped {
            if let Some(slot) = self.accessing_kind(frame).and_then(opener_slot) {
                self.open[slot] = self.open[slot].saturating_sub(1);
            }
        }
        popped
    }

    fn is_open(&self, opener: SyntaxKind) -> bool {
        opener_slot(opener).is_some_and(|slot| self.open[slot] > 0)
    }

    fn terminal(&self, la: &La) -> Option<TerminalId> {
        match la {
            La::Token(token) => self.table.terminal_for(token.kind),
            La::Reused { first, .. } => self.table.terminal_for(*first),
            La::Eoi => Some(TerminalId::EOI),
        }
    }

    fn la_range(&self, la: &La) -> TextRange {
        match la {
            La::Token(token) => token.range,
            La::Reused { id, .. } => self.builder.range(*id),
            La::Eoi => TextRange::empty(TextSize::of(self.text)),
        }
    }

    /// End of the last element, where missing tokens go
    fn cursor(&self) -> TextSize {
        self.elements
            .last()
            .map_or(TextSize::new(0), |&id| self.builder.range(id).end())
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Lex up to the next significant token, buffering trivia. At a node
    /// boundary a subtree of the previous tree may be returned instead.
    fn fetch(&mut self, allow_reuse: bool) -> La {
        loop {
            if allow_reuse {
                if let Some(la) = self.try_reuse() {
                    return la;
                }
            }
            let Some(token) = self.lexer.next_token() else {
                return La::Eoi;
            };
            self.stats.tokens += 1;
            if token.is_trivia() {
                let id = self.builder.token(&token);
                self.pending.push(id);
                continue;
            }
            return La::Token(token);
        }
    }

    fn try_reuse(&mut self) -> Option<La> {
        let plan = self.reuse?;
        let node = self.landmarks.node?;
        let top = self.top();
        self.table.goto(top, node)?;

        let offset = self.lexer.offset();
        let candidate = plan.candidate(offset).filter(|c| {
            c.state == self.lexer.state()
                && matches!(self.table.action_for(top, c.first), Action::Shift(_))
                && u32::from(offset + c.len) as usize <= self.text.len()
        })?;

        let id = self.builder.graft(plan.old(), candidate.node, candidate.delta);
        self.lexer.skip_to(offset + candidate.len);
        self.stats.reused_nodes += 1;
        self.stats.reused_bytes += u32::from(candidate.len) as usize;
        tracing::trace!(offset = u32::from(offset), len = u32::from(candidate.len), "reused node");
        Some(La::Reused {
            id,
            first: candidate.first,
        })
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    fn shift(&mut self, la: La, to: StateId) {
        let table = self.table;
        let trivia = self.pending.len();
        self.elements.append(&mut self.pending);
        let state = match la {
            La::Token(token) => {
                let id = self.builder.token(&token);
                self.elements.push(id);
                tracing::trace!(kind = ?token.kind, state = to.index(), "shift");
                to
            }
            La::Reused { id, .. } => {
                self.elements.push(id);
                // The copy stands for a whole node, so move straight to the
                // state after that nonterminal
                match self.landmarks.node.and_then(|n| table.goto(self.top(), n)) {
                    Some(state) => state,
                    None => to,
                }
            }
            La::Eoi => to,
        };
        self.push_frame(Frame {
            state,
            elements: trivia + 1,
        });
        self.la = None;
        self.stats.shifts += 1;
    }

    /// Pop the rule's frames and push the goto. False if the table has no
    /// goto, which means the table and stack disagree.
    fn reduce(&mut self, rule: RuleId) -> bool {
        let table = self.table;
        let (lhs, len) = {
            let rule = table.rule(rule);
            (rule.lhs, rule.rhs.len())
        };
        let frames = self.pop_frames(self.stack.len().saturating_sub(len));
        let count: usize = frames.iter().map(|f| f.elements).sum();
        let start = self.elements.len().saturating_sub(count);
        let pushed = match table.rule_kind(rule) {
            Some(kind) => self.wrap(kind, start),
            None => count,
        };

        let Some(to) = table.goto(self.top(), lhs) else {
            return false;
        };
        tracing::trace!(rule = rule.index(), state = to.index(), "reduce");
        self.push_frame(Frame {
            state: to,
            elements: pushed,
        });
        self.stats.reductions += 1;
        true
    }

    /// Replace `elements[start..]` by its leading trivia followed by one node
    /// of `kind` over the rest. Returns how many elements now follow `start`.
    fn wrap(&mut self, kind: SyntaxKind, start: usize) -> usize {
        let lead = self.elements[start..]
            .iter()
            .take_while(|&&id| self.builder.kind(id).is_trivia())
            .count();
        let children = self.elements.split_off(start + lead);
        let kind = if kind == SyntaxKind::NODE && self.is_version_marker(&children) {
            SyntaxKind::VERSION
        } else {
            kind
        };
        let at = self.cursor();
        let node = self.builder.node_from_children(kind, &children, at);
        self.elements.push(node);
        lead + 1
    }

    /// Version markers only count outside children blocks
    fn is_version_marker(&self, children: &[NodeId]) -> bool {
        !self.is_open(SyntaxKind::L_BRACE)
            && kdl::is_version_marker(
                children
                    .iter()
                    .map(|&id| (self.builder.kind(id), &self.text[self.builder.range(id)])),
            )
    }

    fn finish(mut self) -> Tree {
        let mut children = std::mem::take(&mut self.elements);
        children.append(&mut self.pending);
        let root = self
            .builder
            .node_from_children(SyntaxKind::DOCUMENT, &children, TextSize::new(0));

        tracing::debug!(
            len = self.text.len(),
            tokens = self.stats.tokens,
            recoveries = self.stats.recoveries,
            reused = self.stats.reused_nodes,
            errors = self.diagnostics.len(),
            "parsed document"
        );

        let lines = self.lexer.into_line_index();
        let mut diagnostics = if self.options.collect_diagnostics {
            self.diagnostics
        } else {
            Vec::new()
        };
        diagnostics.sort_by_key(|d| d.range.start());
        for diagnostic in &mut diagnostics {
            diagnostic.locate(&lines);
        }
        self.builder
            .into_tree(root, self.text.to_string(), lines, diagnostics, self.stats)
    }

    // =========================================================================
    // RECOVERY
    // =========================================================================

    fn recover(&mut self, la: La) -> bool {
        self.stats.recoveries += 1;
        if self.try_close(&la) {
            return true;
        }

        let offset = self.la_range(&la).start();
        if self.recoveries.0 == offset {
            self.recoveries.1 += 1;
        } else {
            self.recoveries = (offset, 1);
        }
        if self.recoveries.1 > self.options.max_recoveries_per_token {
            if matches!(la, La::Eoi) {
                return false;
            }
            tracing::debug!(offset = u32::from(offset), "recovery budget exhausted, skipping token");
            self.force_skip();
            return true;
        }

        let context = self.context();
        if self.try_insert(&la, context) {
            return true;
        }
        self.report_unexpected(&la, context);
        self.panic_mode()
    }

    /// Simulate the automaton from `base` with `pushed` on top over
    /// `terminals`; true if every terminal is shifted (or the input is
    /// accepted). `base` is only read: states pushed during the simulation
    /// live in a local overlay and reductions that reach below it move
    /// `floor` down instead.
    fn accepts(&self, base: &[Frame], pushed: &[StateId], terminals: &[TerminalId]) -> bool {
        let table = self.table;
        let mut floor = base.len();
        let mut overlay = pushed.to_vec();
        let top_of = |overlay: &[StateId], floor: usize| {
            overlay
                .last()
                .copied()
                .or_else(|| floor.checked_sub(1).map(|i| base[i].state))
        };

        for &terminal in terminals {
            loop {
                let Some(top) = top_of(&overlay, floor) else {
                    return false;
                };
                let action = match table.default_reduction(top) {
                    Some(rule) => Action::Reduce(rule),
                    None => table.action(top, terminal),
                };
                match action {
                    Action::Shift(to) => {
                        overlay.push(to);
                        break;
                    }
                    Action::Reduce(rule) => {
                        let rule = table.rule(rule);
                        let len = rule.rhs.len();
                        let from_overlay = len.min(overlay.len());
                        overlay.truncate(overlay.len() - from_overlay);
                        let Some(rest) = floor.checked_sub(len - from_overlay) else {
                            return false;
                        };
                        floor = rest;
                        let Some(to) = top_of(&overlay, floor).and_then(|s| table.goto(s, rule.lhs)) else {
                            return false;
                        };
                        overlay.push(to);
                    }
                    Action::Accept => return true,
                    Action::Error => return false,
                }
            }
        }
        true
    }

    fn try_insert(&mut self, la: &La, context: ParseContext) -> bool {
        if !self.options.insert_missing {
            return false;
        }
        let Some(la_terminal) = self.terminal(la) else {
            return false;
        };
        let offset = self.la_range(la).start();
        if self.insertions.0 != offset {
            self.insertions = (offset, 0);
        }
        if self.insertions.1 >= self.options.max_insertions {
            return false;
        }

        let budget = self.options.max_insertions - self.insertions.1;
        let Some((kind, terminal)) = self.insertion(la_terminal, budget) else {
            return false;
        };
        self.insertions.1 += 1;
        self.insert_missing(kind, terminal, la, context)
    }

    /// At the end of input, or at a closer that belongs further out, close
    /// the innermost open construct. One closer per call; each one ends a
    /// construct whose opener is on the stack, so a lookahead gets at most
    /// as many as were open when it was first seen.
    fn try_close(&mut self, la: &La) -> bool {
        if !self.options.insert_missing {
            return false;
        }
        let closes_outer = match la {
            La::Eoi => true,
            La::Token(token) => {
                matches!(token.kind, SyntaxKind::R_BRACE | SyntaxKind::R_PAREN)
                    && self.is_open(opened_by(token.kind))
            }
            La::Reused { .. } => false,
        };
        if !closes_outer {
            return false;
        }

        let offset = self.la_range(la).start();
        if self.closings.0 != offset {
            self.closings = (offset, self.open.iter().sum());
        }
        if self.closings.1 == 0 {
            return false;
        }

        let Some((kind, terminal)) = self
            .closers()
            .into_iter()
            .find(|&(_, terminal)| self.accepts(&self.stack, &[], &[terminal]))
        else {
            return false;
        };
        self.closings.1 -= 1;
        let context = self.context();
        self.insert_missing(kind, terminal, la, context)
    }

    /// Report a missing `kind`, run the reductions it triggers, then shift it
    /// as a zero-width leaf
    fn insert_missing(&mut self, kind: SyntaxKind, terminal: TerminalId, la: &La, context: ParseContext) -> bool {
        let table = self.table;
        let at = self.cursor();
        self.report_missing(kind, la, at, context);
        tracing::debug!(kind = ?kind, offset = u32::from(at), "inserted missing token");

        loop {
            let top = self.top();
            let action = match table.default_reduction(top) {
                Some(rule) => Action::Reduce(rule),
                None => table.action(top, terminal),
            };
            match action {
                Action::Shift(to) => {
                    let id = self.builder.missing(kind, at, self.lexer.state());
                    self.elements.push(id);
                    self.push_frame(Frame {
                        state: to,
                        elements: 1,
                    });
                    return true;
                }
                Action::Reduce(rule) => {
                    if !self.reduce(rule) {
                        return false;
                    }
                }
                Action::Accept | Action::Error => return false,
            }
        }
    }

    /// Insertable closers of constructs still open on the stack
    fn closers(&self) -> Vec<(SyntaxKind, TerminalId)> {
        kdl::INSERTABLE
            .iter()
            .filter(|&&kind| self.is_open(opened_by(kind)))
            .filter_map(|&kind| Some((kind, self.table.terminal_for(kind)?)))
            .collect()
    }

    /// First token of the shortest run of at most `budget` missing closers
    /// after which `la` is accepted
    fn insertion(&self, la: TerminalId, budget: usize) -> Option<(SyntaxKind, TerminalId)> {
        let closers = self.closers();
        if closers.is_empty() {
            return None;
        }

        let mut run = Vec::with_capacity(budget + 1);
        for depth in 1..=budget {
            let mut choice = vec![0; depth];
            loop {
                run.clear();
                run.extend(choice.iter().map(|&i| closers[i].1));
                run.push(la);
                if self.accepts(&self.stack, &[], &run) {
                    return Some(closers[choice[0]]);
                }
                if !advance(&mut choice, closers.len()) {
                    break;
                }
            }
        }
        None
    }

    /// Pop to a state that shifts `error`, skip input until the lookahead
    /// fits after it, and wrap everything dropped in an `ERROR` node.
    fn panic_mode(&mut self) -> bool {
        let table = self.table;
        let mut skipped = Vec::new();
        let mut below = self.stack.len();

        loop {
            let Some((frame, to)) = (0..below).rev().find_map(|i| match table.action(self.stack[i].state, TerminalId::ERROR) {
                Action::Shift(to) => Some((i, to)),
                _ => None,
            }) else {
                // Nothing can absorb the error; keep what was skipped in the tree
                if !skipped.is_empty() {
                    self.push_error_node(skipped);
                }
                return false;
            };

            loop {
                let la = match self.la {
                    Some(la) => la,
                    None => {
                        let la = self.fetch(false);
                        self.la = Some(la);
                        la
                    }
                };
                let fits = self
                    .terminal(&la)
                    .is_some_and(|t| self.accepts(&self.stack[..=frame], &[to], &[t]));
                if fits {
                    self.commit_error(frame, to, skipped);
                    return true;
                }
                if matches!(la, La::Eoi) {
                    // Leave enclosing blocks to be closed rather than
                    // swallowing them
                    if self.closable_after_error(frame, to) {
                        self.commit_error(frame, to, skipped);
                        return true;
                    }
                    break;
                }
                self.skip_lookahead(&mut skipped);
            }
            below = frame;
        }
    }

    /// True if a missing closer could follow the `error` shifted from
    /// `stack[frame]` into `to`
    fn closable_after_error(&self, frame: usize, to: StateId) -> bool {
        self.options.insert_missing
            && self
                .closers()
                .iter()
                .any(|&(_, closer)| self.accepts(&self.stack[..=frame], &[to], &[closer]))
    }

    fn commit_error(&mut self, frame: usize, to: StateId, skipped: Vec<NodeId>) {
        let popped = self.pop_frames(frame + 1);
        let count: usize = popped.iter().map(|f| f.elements).sum();
        let mut children = self.elements.split_off(self.elements.len().saturating_sub(count));
        children.extend(skipped);
        tracing::debug!(
            popped = popped.len(),
            elements = children.len(),
            state = to.index(),
            "panic-mode recovery"
        );
        let pushed = self.push_error_node(children);
        self.push_frame(Frame {
            state: to,
            elements: pushed,
        });
    }

    /// Push `children` as an `ERROR` node with leading trivia left outside.
    /// Returns the number of elements pushed.
    fn push_error_node(&mut self, mut children: Vec<NodeId>) -> usize {
        let lead = children
            .iter()
            .take_while(|&&id| self.builder.kind(id).is_trivia())
            .count();
        let rest = children.split_off(lead);
        self.elements.append(&mut children);
        if rest.is_empty() {
            return lead;
        }
        let at = self.cursor();
        let node = self.builder.node_from_children(SyntaxKind::ERROR, &rest, at);
        self.elements.push(node);
        lead + 1
    }

    /// Move the lookahead (and the trivia before it) into `into`
    fn skip_lookahead(&mut self, into: &mut Vec<NodeId>) {
        match self.la.take() {
            Some(La::Token(token)) => {
                into.append(&mut self.pending);
                into.push(self.builder.token(&token));
            }
            Some(La::Reused { id, .. }) => {
                into.append(&mut self.pending);
                into.push(id);
            }
            Some(La::Eoi) => self.la = Some(La::Eoi),
            None => {}
        }
    }

    /// Wrap the lookahead in an `ERROR` node owned by the top frame
    fn force_skip(&mut self) {
        let mut skipped = Vec::new();
        self.skip_lookahead(&mut skipped);
        let pushed = self.push_error_node(skipped);
        if let Some(frame) = self.stack.last_mut() {
            frame.elements += pushed;
        }
    }

    /// Wrap all remaining input in one `ERROR` node and end the parse
    fn fallback(mut self) -> Tree {
        let mut rest = Vec::new();
        self.skip_lookahead(&mut rest);
        rest.append(&mut self.pending);
        while let Some(token) = self.lexer.next_token() {
            self.stats.tokens += 1;
            rest.push(self.builder.token(&token));
        }
        if !rest.is_empty() {
            let at = self.cursor();
            let node = self.builder.node_from_children(SyntaxKind::ERROR, &rest, at);
            self.elements.push(node);
        }
        tracing::debug!(offset = u32::from(self.cursor()), "no recovery state, wrapping rest of input");
        self.finish()
    }

    fn internal_error(mut self) -> Tree {
        let at = self.cursor();
        self.diagnostics.push(SyntaxError::at_offset(
            "parse table has no transition for a completed rule",
            at,
            ErrorCode::E0999,
        ));
        self.fallback()
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    fn accessing_kind(&self, frame: &Frame) -> Option<SyntaxKind> {
        match self.table.accessing_symbol(frame.state)? {
            SymbolId::Terminal(t) => self.table.terminal_kind(t),
            SymbolId::Nonterminal(_) => None,
        }
    }

    fn accessing_nonterminal(&self, frame: &Frame) -> Option<NonterminalId> {
        match self.table.accessing_symbol(frame.state)? {
            SymbolId::Nonterminal(n) => Some(n),
            SymbolId::Terminal(_) => None,
        }
    }

    /// Innermost open construct on the stack
    fn context(&self) -> ParseContext {
        let marks = &self.landmarks;
        for frame in self.stack.iter().rev() {
            if let Some(context) = self.accessing_kind(frame).and_then(ParseContext::opened_by) {
                return context;
            }
            let nonterminal = self.accessing_nonterminal(frame);
            if nonterminal.is_some() && nonterminal == marks.slashdash {
                return ParseContext::Slashdash;
            }
            if nonterminal.is_some()
                && (nonterminal == marks.head
                    || nonterminal == marks.entries
                    || nonterminal == marks.after_children)
            {
                return ParseContext::NodeEntries;
            }
        }
        ParseContext::TopLevel
    }

    /// The token that opened the innermost unclosed `kind`, if any
    fn opener(&self, kind: SyntaxKind) -> Option<NodeId> {
        if opener_slot(kind).is_some() && !self.is_open(kind) {
            return None;
        }
        let mut end = self.elements.len();
        for frame in self.stack.iter().rev() {
            if self.accessing_kind(frame) == Some(kind) {
                return end.checked_sub(1).map(|i| self.elements[i]);
            }
            end = end.saturating_sub(frame.elements);
        }
        None
    }

    fn classify(&self, la: &La, context: ParseContext) -> ErrorCode {
        let kind = match la {
            La::Token(token) => {
                if token.kind == SyntaxKind::ERROR {
                    return token.error.as_ref().map_or(ErrorCode::E0101, ErrorCode::from);
                }
                Some(token.kind)
            }
            La::Reused { first, .. } => Some(*first),
            La::Eoi => None,
        };
        let after_children = self
            .stack
            .last()
            .and_then(|f| self.accessing_nonterminal(f))
            .is_some_and(|n| Some(n) == self.landmarks.after_children);

        match (context, kind) {
            (ParseContext::String, None) => ErrorCode::E0102,
            (_, None) if self.opener(SyntaxKind::L_PAREN).is_some() => ErrorCode::E0203,
            (_, None) if self.opener(SyntaxKind::L_BRACE).is_some() => ErrorCode::E0202,
            (_, Some(SyntaxKind::R_BRACE)) if self.opener(SyntaxKind::L_BRACE).is_none() => ErrorCode::E0204,
            (ParseContext::PropertyValue, _) => ErrorCode::E0303,
            (ParseContext::TypeAnnotation, _) => ErrorCode::E0304,
            (ParseContext::Slashdash, _) => ErrorCode::E0305,
            (ParseContext::NodeEntries, Some(kind)) if after_children => {
                if starts_entry(kind) {
                    ErrorCode::E0302
                } else {
                    ErrorCode::E0201
                }
            }
            (context, Some(kind))
                if context.is_between_nodes()
                    && (kind.is_number() || kind.is_keyword() || kind == SyntaxKind::EQ) =>
            {
                ErrorCode::E0301
            }
            _ => ErrorCode::E0901,
        }
    }

    fn expected_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for terminal in self.table.expected(self.top()) {
            let name = self.table.terminal_name(terminal);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn report_unexpected(&mut self, la: &La, context: ParseContext) {
        if !self.options.collect_diagnostics {
            return;
        }
        let range = self.la_range(la);
        if self
            .diagnostics
            .last()
            .is_some_and(|d| d.range.start() == range.start())
        {
            return;
        }

        let code = self.classify(la, context);
        let mut error = match la {
            La::Token(token) if token.kind == SyntaxKind::ERROR => {
                let message = token
                    .error
                    .map_or_else(|| code.default_message().to_string(), |e| e.to_string());
                SyntaxError::new(format!("{message} {}", context.description()), range, code)
            }
            La::Token(token) => SyntaxError::unexpected(kind_to_name(token.kind), context, range, code),
            La::Reused { .. } => SyntaxError::unexpected("node", context, range, code),
            La::Eoi => SyntaxError::unexpected("end of input", context, range, code),
        };

        let expected = self.expected_names();
        if !expected.is_empty() {
            error = error.with_hint(format!("expected one of: {}", expected.join(", ")));
        }
        let opener = match code {
            ErrorCode::E0202 => self.opener(SyntaxKind::L_BRACE),
            ErrorCode::E0203 => self.opener(SyntaxKind::L_PAREN),
            _ => None,
        };
        if let Some(id) = opener {
            error = error.with_related(RelatedInfo::new(
                "opened here",
                self.builder.range(id),
            ));
        }
        self.diagnostics.push(error);
    }

    fn report_missing(&mut self, kind: SyntaxKind, la: &La, at: TextSize, context: ParseContext) {
        if !self.options.collect_diagnostics {
            return;
        }
        let code = match kind {
            SyntaxKind::R_BRACE => ErrorCode::E0202,
            SyntaxKind::R_PAREN => ErrorCode::E0203,
            kind if kind.is_string_start() || kind == SyntaxKind::RAW_STRING_END => ErrorCode::E0102,
            _ => ErrorCode::E0902,
        };
        let mut error = SyntaxError::at_offset(
            format!("missing {} {}", kind_to_name(kind), context.description()),
            at,
            code,
        );
        if let Some(id) = self.opener(opened_by(kind)) {
            error = error.with_related(RelatedInfo::new(
                "opened here",
                self.builder.range(id),
            ));
        }
        if kind == SyntaxKind::QUOTE
            && matches!(la, La::Token(token) if token.kind == SyntaxKind::NEWLINE)
        {
            error = error.with_hint("quoted strings end at the line; use \"\"\" for multi-line text");
        }
        self.diagnostics.push(error);
    }
}

/// Tokens whose frames stay on the stack until their construct is closed
const OPENERS: [SyntaxKind; 5] = [
    SyntaxKind::L_BRACE,
    SyntaxKind::L_PAREN,
    SyntaxKind::QUOTE,
    SyntaxKind::TRIPLE_QUOTE,
    SyntaxKind::RAW_STRING_START,
];

fn opener_slot(kind: SyntaxKind) -> Option<usize> {
    OPENERS.iter().position(|&k| k == kind)
}

/// Token that opens the construct `closer` ends
fn opened_by(closer: SyntaxKind) -> SyntaxKind {
    match closer {
        SyntaxKind::R_BRACE => SyntaxKind::L_BRACE,
        SyntaxKind::R_PAREN => SyntaxKind::L_PAREN,
        SyntaxKind::RAW_STRING_END => SyntaxKind::RAW_STRING_START,
        kind => kind,
    }
}

/// Step `choice` to the next combination in base `base`; false after the last
fn advance(choice: &mut [usize], base: usize) -> bool {
    for digit in choice.iter_mut().rev() {
        *digit += 1;
        if *digit < base {
            return true;
        }
        *digit = 0;
    }
    false
}

/// Tokens that can begin an argument or property
fn starts_entry(kind: SyntaxKind) -> bool {
    kind == SyntaxKind::BARE_IDENT
        || kind == SyntaxKind::L_PAREN
        || kind == SyntaxKind::SLASHDASH
        || kind.is_number()
        || kind.is_keyword()
        || kind.is_string_start()
}
