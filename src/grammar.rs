//! Grammar representation: CNF rules over interned symbols.
//!
//! A grammar is a value snapshot: the binary rule list is replaced wholesale
//! after each sentence rather than mutated in place, so the pre-update list
//! stays intact for the convergence comparison. Unary rules are fixed inputs
//! and never re-estimated.

use crate::symbol::{NtId, SymbolTable, WordId};
use rustc_hash::FxHashMap;

/// Lexical rule `lhs -> 'word'`. Probability is a fixed input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryRule {
    pub lhs: NtId,
    pub word: WordId,
    pub prob: f64,
}

/// Binary rule `lhs -> left right`. The only rule class the EM step updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryRule {
    pub lhs: NtId,
    pub left: NtId,
    pub right: NtId,
    pub prob: f64,
}

/// A CNF grammar snapshot: vocabularies plus the current rule lists.
///
/// The start symbol is the first nonterminal interned, id 0.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub nonterminals: SymbolTable,
    pub words: SymbolTable,
    pub unary: Vec<UnaryRule>,
    pub binary: Vec<BinaryRule>,
}

/// The distinguished start symbol.
pub const START: NtId = 0;

impl Grammar {
    pub fn new(nonterminals: SymbolTable, words: SymbolTable) -> Self {
        Grammar {
            nonterminals,
            words,
            unary: Vec::new(),
            binary: Vec::new(),
        }
    }

    /// Replace the binary rule list with a re-estimated one.
    pub fn replace_binary(&mut self, rules: Vec<BinaryRule>) {
        self.binary = rules;
    }

    /// Drop binary rules whose probability is exactly 0.0.
    ///
    /// Returns the number of rules removed. Relative order of the survivors
    /// is preserved so positional comparison across passes stays meaningful.
    pub fn prune_dead_binary(&mut self) -> usize {
        let before = self.binary.len();
        self.binary.retain(|r| r.prob != 0.0);
        before - self.binary.len()
    }
}

/// Index over a binary rule list, valid as long as the list's order and
/// structure are unchanged (probabilities may vary freely).
///
/// Re-estimation keeps rules positionally aligned within a pass, so one
/// index built at pass start serves every sentence of that pass.
#[derive(Debug, Default)]
pub struct RuleIndex {
    by_children: FxHashMap<(NtId, NtId), Vec<usize>>,
    by_lhs: FxHashMap<NtId, Vec<usize>>,
}

impl RuleIndex {
    /// Build the index for `rules`.
    pub fn build(rules: &[BinaryRule]) -> Self {
        let mut index = RuleIndex::default();
        for (i, rule) in rules.iter().enumerate() {
            index
                .by_children
                .entry((rule.left, rule.right))
                .or_default()
                .push(i);
            index.by_lhs.entry(rule.lhs).or_default().push(i);
        }
        index
    }

    /// Rules whose right-hand side is exactly `left right`.
    #[inline]
    pub fn with_children(&self, left: NtId, right: NtId) -> &[usize] {
        self.by_children
            .get(&(left, right))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Rules whose left-hand side is `lhs`.
    #[inline]
    pub fn with_lhs(&self, lhs: NtId) -> &[usize] {
        self.by_lhs.get(&lhs).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
