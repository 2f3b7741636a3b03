//! Command-line trainer.
//!
//! Takes no arguments; reads the fixed file names from the working
//! directory (`nonterminals.txt`, optional `terminals.txt` / `pcfg.txt` /
//! `pos.txt`, and `training.txt`), writes per-pass dumps under `log/` and
//! the trained grammar to `output.txt`. Exits non-zero when a required
//! input is missing or the grammar is malformed.

use env_logger::Env;
use log::{error, info};
use pcfg_trainer::{load_corpus, load_grammar, LogWriter, Trainer, TrainerState};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut grammar = match load_grammar(Path::new(".")) {
        Ok(g) => g,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let corpus = match load_corpus(Path::new("training.txt"), &mut grammar.words) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "loaded {} nonterminals, {} unary rules, {} binary rules, {} sentences",
        grammar.nonterminals.len(),
        grammar.unary.len(),
        grammar.binary.len(),
        corpus.len()
    );

    let mut writer = LogWriter::new("log", "output.txt");
    let mut trainer = Trainer::new(grammar);
    let stats = trainer.train(&corpus, &mut writer);

    match trainer.state() {
        TrainerState::Converged => {
            info!(
                "training terminated: improvement below threshold after {} passes",
                stats.passes
            );
            ExitCode::SUCCESS
        }
        _ => {
            error!("training stopped after {} passes without converging", stats.passes);
            ExitCode::FAILURE
        }
    }
}
