//! Unsupervised PCFG training with the inside-outside algorithm.
//!
//! This crate trains a probabilistic context-free grammar in Chomsky Normal
//! Form from raw sentences. It provides:
//! - Interned grammar representation (unary and binary rules)
//! - Inside and outside probability charts per sentence
//! - EM re-estimation of binary rule probabilities
//! - A convergence-driven training loop with per-pass reporting
//! - Grammar/corpus file loading and rule dump formatting
//!
//! Training is single-threaded and order-sensitive: rule probabilities are
//! folded back after every sentence, so corpus order is part of the
//! algorithm's definition.

pub mod chart;
pub mod estimate;
pub mod grammar;
pub mod inside;
pub mod loader;
pub mod outside;
pub mod report;
pub mod symbol;
pub mod trainer;

// Re-exports for convenience
pub use chart::SpanChart;
pub use estimate::{check_improvement, reestimate};
pub use grammar::{BinaryRule, Grammar, RuleIndex, UnaryRule, START};
pub use inside::inside_chart;
pub use loader::{build_grammar, load_corpus, load_grammar, GrammarError};
pub use outside::outside_chart;
pub use report::{format_grammar, LogWriter};
pub use symbol::{NtId, SymbolTable, WordId};
pub use trainer::{
    NullObserver, PassObserver, Sentence, Trainer, TrainerConfig, TrainerState, TrainerStats,
};
