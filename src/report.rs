//! Rule dump formatting and the file-backed pass observer.
//!
//! Every pass produces a full textual dump of the grammar, one rule per
//! line: binary rules as `LHS -> LEFT RIGHT prob`, then unary rules as
//! `LHS -> 'terminal' prob`. Rules with a negative probability are skipped,
//! a formatting convention kept for fidelity (probabilities never go
//! negative in practice).

use crate::grammar::Grammar;
use crate::trainer::PassObserver;
use log::warn;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Render the grammar as a rule-per-line dump.
pub fn format_grammar(grammar: &Grammar) -> String {
    let mut out = String::new();

    for rule in &grammar.binary {
        if rule.prob >= 0.0 {
            let _ = writeln!(
                out,
                "{} -> {} {} {}",
                grammar.nonterminals.resolve(rule.lhs),
                grammar.nonterminals.resolve(rule.left),
                grammar.nonterminals.resolve(rule.right),
                rule.prob
            );
        }
    }

    for rule in &grammar.unary {
        if rule.prob >= 0.0 {
            let _ = writeln!(
                out,
                "{} -> '{}' {}",
                grammar.nonterminals.resolve(rule.lhs),
                grammar.words.resolve(rule.word),
                rule.prob
            );
        }
    }

    out
}

/// Pass observer that writes `<log_dir>/<pass>.log` after each pass and the
/// final grammar to `output_path` on convergence.
///
/// Write failures are logged as warnings and never interrupt training.
pub struct LogWriter {
    log_dir: PathBuf,
    output_path: PathBuf,
}

impl LogWriter {
    pub fn new(log_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        LogWriter {
            log_dir: log_dir.into(),
            output_path: output_path.into(),
        }
    }

    fn write_dump(&self, path: &Path, grammar: &Grammar) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("could not create {}: {e}", parent.display());
                    return;
                }
            }
        }
        if let Err(e) = fs::write(path, format_grammar(grammar)) {
            warn!("could not write {}: {e}", path.display());
        }
    }
}

impl PassObserver for LogWriter {
    fn pass_complete(&mut self, pass: usize, grammar: &Grammar) {
        let path = self.log_dir.join(format!("{pass}.log"));
        self.write_dump(&path, grammar);
    }

    fn converged(&mut self, grammar: &Grammar) {
        let path = self.output_path.clone();
        self.write_dump(&path, grammar);
    }
}
