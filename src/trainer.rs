//! Convergence-driven training loop.
//!
//! One pass walks the corpus in order; every sentence builds its inside and
//! outside charts and immediately folds the re-estimated binary rules back
//! into the grammar, so sentence k sees the updates of sentences 1..k-1 of
//! the same pass. Ordering is load-bearing: reordering the corpus changes
//! the numeric outcome. Training repeats passes until the maximum per-rule
//! probability change drops below the threshold.

use crate::estimate::{check_improvement, reestimate};
use crate::grammar::{Grammar, RuleIndex, START};
use crate::inside::inside_chart;
use crate::outside::outside_chart;
use crate::symbol::WordId;
use log::info;

/// One training sentence as interned tokens.
pub type Sentence = Vec<WordId>;

/// Training configuration.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Convergence threshold on the max per-rule probability change.
    pub threshold: f64,
    /// Maximum number of passes (0 = unlimited). The reference procedure has
    /// no cap and can run forever on a non-converging grammar; the cap bounds
    /// worst-case runtime without changing converging runs.
    pub max_passes: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            threshold: 1e-4,
            max_passes: 0,
        }
    }
}

/// Where the training loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Initializing,
    IteratingPass,
    Converged,
}

/// Statistics about a training run.
#[derive(Debug, Clone, Default)]
pub struct TrainerStats {
    pub passes: usize,
    pub rules_pruned: usize,
    pub last_delta: f64,
}

/// Receives the grammar after every pass and once more on convergence.
pub trait PassObserver {
    fn pass_complete(&mut self, pass: usize, grammar: &Grammar);
    fn converged(&mut self, grammar: &Grammar);
}

/// Observer that discards everything.
pub struct NullObserver;

impl PassObserver for NullObserver {
    fn pass_complete(&mut self, _pass: usize, _grammar: &Grammar) {}
    fn converged(&mut self, _grammar: &Grammar) {}
}

/// Inside-outside trainer over a fixed corpus.
pub struct Trainer {
    grammar: Grammar,
    config: TrainerConfig,
    state: TrainerState,
    stats: TrainerStats,
}

impl Trainer {
    pub fn new(grammar: Grammar) -> Self {
        Self::with_config(grammar, TrainerConfig::default())
    }

    pub fn with_config(grammar: Grammar, config: TrainerConfig) -> Self {
        Trainer {
            grammar,
            config,
            state: TrainerState::Initializing,
            stats: TrainerStats::default(),
        }
    }

    /// The current grammar snapshot (final grammar once training is done).
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn stats(&self) -> &TrainerStats {
        &self.stats
    }

    /// One sequential pass over the corpus, updating the grammar in place
    /// after every sentence.
    fn run_pass(&mut self, corpus: &[Sentence]) {
        // Re-estimation keeps the rule list positionally aligned, so the
        // index built here stays valid for the whole pass.
        let index = RuleIndex::build(&self.grammar.binary);
        for sentence in corpus {
            let inside = inside_chart(sentence, &self.grammar.unary, &self.grammar.binary, &index);
            let outside = outside_chart(&inside, &self.grammar.binary, &index, START);
            let updated = reestimate(&inside, &outside, &self.grammar.binary);
            self.grammar.replace_binary(updated);
        }
    }

    /// Train to convergence (or to the pass cap). Returns the run statistics;
    /// the trained grammar is available through [`Trainer::grammar`].
    pub fn train(&mut self, corpus: &[Sentence], observer: &mut dyn PassObserver) -> TrainerStats {
        self.state = TrainerState::Initializing;
        self.stats = TrainerStats::default();

        let before = self.grammar.binary.clone();
        self.run_pass(corpus);
        self.stats.passes = 1;
        let mut delta = check_improvement(&before, &self.grammar.binary);
        self.stats.last_delta = delta;
        info!(
            "pass 1: {} binary rules, max delta {:.6e}",
            self.grammar.binary.len(),
            delta
        );
        observer.pass_complete(1, &self.grammar);
        self.state = TrainerState::IteratingPass;

        while delta >= self.config.threshold {
            if self.config.max_passes > 0 && self.stats.passes >= self.config.max_passes {
                info!(
                    "stopping after {} passes without convergence (max delta {:.6e})",
                    self.stats.passes, delta
                );
                return self.stats.clone();
            }

            // Dead rules are dropped only on pass entry, never mid-pass.
            self.stats.rules_pruned += self.grammar.prune_dead_binary();

            let before = self.grammar.binary.clone();
            self.run_pass(corpus);
            self.stats.passes += 1;
            delta = check_improvement(&before, &self.grammar.binary);
            self.stats.last_delta = delta;
            info!(
                "pass {}: {} binary rules, max delta {:.6e}",
                self.stats.passes,
                self.grammar.binary.len(),
                delta
            );
            observer.pass_complete(self.stats.passes, &self.grammar);
        }

        self.state = TrainerState::Converged;
        info!("converged after {} passes", self.stats.passes);
        observer.converged(&self.grammar);
        self.stats.clone()
    }
}
