//! Grammar and corpus loading.
//!
//! File formats follow the original training setup:
//!
//! - `nonterminals.txt` (required): one nonterminal per line, the first is
//!   the start symbol.
//! - `terminals.txt` (optional): one terminal per line; only needed to
//!   generate lexical rules when neither `pcfg.txt` nor `pos.txt` exists.
//! - `pcfg.txt` (optional): rules `A -> B C p` or `A -> w p`; the
//!   probability field is optional but must be present on all lines or on
//!   none. Without probabilities, uniform priors are assigned per lhs.
//! - `pos.txt` (optional, consulted only without `pcfg.txt`): lexical rules
//!   restricting which nonterminals are preterminals.
//! - `training.txt` (required): one whitespace-tokenized sentence per line.
//!
//! All fatal conditions surface here, before training starts. The numerical
//! core never fails.

use crate::grammar::{BinaryRule, Grammar, UnaryRule};
use crate::symbol::SymbolTable;
use crate::trainer::Sentence;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Loader error type.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("required file '{0}' could not be found")]
    MissingInput(String),
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("grammar line {line}: {reason}")]
    MalformedGrammar { line: usize, reason: String },
    #[error("grammar line {line}: probability {prob} exceeds 1.0")]
    InvalidProbability { line: usize, prob: f64 },
}

pub type Result<T> = std::result::Result<T, GrammarError>;

/// A rule field layout: `lhs -> x [p]` (unary) or `lhs -> y z [p]` (binary).
const ARROW: &str = "->";

/// Decide whether a rule file carries probability annotations, judged from
/// its first non-blank line: the last field parses as a number and the line
/// has more fields than a bare unary rule.
fn is_probabilistic(text: &str) -> bool {
    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        return fields.len() > 3 && fields.last().unwrap().parse::<f64>().is_ok();
    }
    false
}

fn parse_prob(field: &str, line: usize) -> Result<f64> {
    let prob: f64 = field.parse().map_err(|_| GrammarError::MalformedGrammar {
        line,
        reason: format!("'{field}' is not a probability"),
    })?;
    if prob > 1.0 {
        return Err(GrammarError::InvalidProbability { line, prob });
    }
    Ok(prob)
}

/// Uniform prior per lhs: 1 / (count of rules sharing that lhs).
fn lhs_priors(lhs_ids: impl Iterator<Item = u32>) -> FxHashMap<u32, f64> {
    let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
    for lhs in lhs_ids {
        *counts.entry(lhs).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(lhs, count)| (lhs, 1.0 / count as f64))
        .collect()
}

/// Parse a `pcfg.txt`-style rule file into unary and binary rules.
///
/// Nonterminal and terminal names are interned into the given tables; rule
/// symbols not present in `nonterminals.txt` are added as they appear.
pub fn parse_rules(
    text: &str,
    nonterminals: &mut SymbolTable,
    words: &mut SymbolTable,
) -> Result<(Vec<UnaryRule>, Vec<BinaryRule>)> {
    let probabilistic = is_probabilistic(text);
    let mut unary = Vec::new();
    let mut binary = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line_num = lineno + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.get(1) != Some(&ARROW) {
            return Err(GrammarError::MalformedGrammar {
                line: line_num,
                reason: "expected 'LHS -> ...'".into(),
            });
        }

        if probabilistic {
            match fields.len() {
                // A -> B C p
                5 => binary.push(BinaryRule {
                    lhs: nonterminals.intern(fields[0]),
                    left: nonterminals.intern(fields[2]),
                    right: nonterminals.intern(fields[3]),
                    prob: parse_prob(fields[4], line_num)?,
                }),
                // A -> w p
                4 => unary.push(UnaryRule {
                    lhs: nonterminals.intern(fields[0]),
                    word: words.intern(fields[2]),
                    prob: parse_prob(fields[3], line_num)?,
                }),
                _ => {
                    return Err(GrammarError::MalformedGrammar {
                        line: line_num,
                        reason: "file mixes annotated and unannotated rules".into(),
                    })
                }
            }
        } else {
            match fields.len() {
                4 => binary.push(BinaryRule {
                    lhs: nonterminals.intern(fields[0]),
                    left: nonterminals.intern(fields[2]),
                    right: nonterminals.intern(fields[3]),
                    prob: 0.0,
                }),
                3 => unary.push(UnaryRule {
                    lhs: nonterminals.intern(fields[0]),
                    word: words.intern(fields[2]),
                    prob: 0.0,
                }),
                _ => {
                    return Err(GrammarError::MalformedGrammar {
                        line: line_num,
                        reason: "file mixes annotated and unannotated rules".into(),
                    })
                }
            }
        }
    }

    if !probabilistic {
        let priors = lhs_priors(unary.iter().map(|r| r.lhs));
        for rule in &mut unary {
            rule.prob = priors[&rule.lhs];
        }
        let priors = lhs_priors(binary.iter().map(|r| r.lhs));
        for rule in &mut binary {
            rule.prob = priors[&rule.lhs];
        }
    }

    Ok((unary, binary))
}

/// Parse a `pos.txt`-style file: lexical rules only.
fn parse_pos_rules(
    text: &str,
    nonterminals: &mut SymbolTable,
    words: &mut SymbolTable,
) -> Result<Vec<UnaryRule>> {
    let probabilistic = is_probabilistic(text);
    let mut unary = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line_num = lineno + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let expected = if probabilistic { 4 } else { 3 };
        if fields.len() != expected || fields[1] != ARROW {
            return Err(GrammarError::MalformedGrammar {
                line: line_num,
                reason: "expected a lexical rule 'A -> w [p]'".into(),
            });
        }
        unary.push(UnaryRule {
            lhs: nonterminals.intern(fields[0]),
            word: words.intern(fields[2]),
            prob: if probabilistic {
                parse_prob(fields[3], line_num)?
            } else {
                0.0
            },
        });
    }

    if !probabilistic {
        let priors = lhs_priors(unary.iter().map(|r| r.lhs));
        for rule in &mut unary {
            rule.prob = priors[&rule.lhs];
        }
    }

    Ok(unary)
}

/// Build the initial grammar from raw file contents.
///
/// With `pcfg` present the rule set is read as-is; otherwise all |NT|³
/// binary rules are generated with uniform priors, and lexical rules come
/// from `pos` (zeroing binary rules headed by preterminals) or, failing
/// that, from the full nonterminal × terminal product. Binary rules at
/// exactly 0.0 are dropped before training.
pub fn build_grammar(
    nonterminal_text: &str,
    terminal_text: Option<&str>,
    pcfg_text: Option<&str>,
    pos_text: Option<&str>,
) -> Result<Grammar> {
    let mut nonterminals = SymbolTable::new();
    for line in nonterminal_text.lines() {
        let name = line.trim();
        if !name.is_empty() {
            nonterminals.intern(name);
        }
    }
    let mut words = SymbolTable::new();

    let (unary, mut binary) = match pcfg_text {
        Some(text) => parse_rules(text, &mut nonterminals, &mut words)?,
        None => {
            let nt_count = nonterminals.len();
            let prior = if nt_count >= 3 {
                1.0 / ((nt_count - 1) as f64 * (nt_count - 2) as f64)
            } else {
                0.0
            };
            let mut binary = Vec::with_capacity(nt_count * nt_count * nt_count);
            for lhs in 0..nt_count as u32 {
                for left in 0..nt_count as u32 {
                    for right in 0..nt_count as u32 {
                        binary.push(BinaryRule {
                            lhs,
                            left,
                            right,
                            prob: prior,
                        });
                    }
                }
            }

            let unary = match pos_text {
                Some(text) => {
                    let unary = parse_pos_rules(text, &mut nonterminals, &mut words)?;
                    // Preterminals produce words only: kill their binary rules.
                    let preterminals: FxHashSet<u32> = unary.iter().map(|r| r.lhs).collect();
                    for rule in &mut binary {
                        if preterminals.contains(&rule.lhs) {
                            rule.prob = 0.0;
                        }
                    }
                    unary
                }
                None => {
                    for line in terminal_text.unwrap_or("").lines() {
                        let word = line.trim();
                        if !word.is_empty() {
                            words.intern(word);
                        }
                    }
                    let word_count = words.len();
                    let prior = if word_count > 0 {
                        1.0 / word_count as f64
                    } else {
                        0.0
                    };
                    let mut unary = Vec::with_capacity(nt_count * word_count);
                    for lhs in 0..nt_count as u32 {
                        for word in 0..word_count as u32 {
                            unary.push(UnaryRule { lhs, word, prob: prior });
                        }
                    }
                    unary
                }
            };
            (unary, binary)
        }
    };

    binary.retain(|r| r.prob != 0.0);

    let mut grammar = Grammar::new(nonterminals, words);
    grammar.unary = unary;
    grammar.binary = binary;
    Ok(grammar)
}

/// Parse corpus text into interned sentences, skipping blank lines.
pub fn parse_corpus(text: &str, words: &mut SymbolTable) -> Vec<Sentence> {
    text.lines()
        .map(|line| {
            line.split_whitespace()
                .map(|token| words.intern(token))
                .collect::<Sentence>()
        })
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

fn read_required(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GrammarError::MissingInput(path.display().to_string()))
        }
        Err(e) => Err(GrammarError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GrammarError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// Load the initial grammar from the fixed file names under `dir`.
pub fn load_grammar(dir: &Path) -> Result<Grammar> {
    let nonterminal_text = read_required(&dir.join("nonterminals.txt"))?;
    let terminal_text = read_optional(&dir.join("terminals.txt"))?;
    let pcfg_text = read_optional(&dir.join("pcfg.txt"))?;
    let pos_text = read_optional(&dir.join("pos.txt"))?;

    build_grammar(
        &nonterminal_text,
        terminal_text.as_deref(),
        pcfg_text.as_deref(),
        pos_text.as_deref(),
    )
}

/// Load the training corpus, interning tokens into the grammar's word table.
pub fn load_corpus(path: &Path, words: &mut SymbolTable) -> Result<Vec<Sentence>> {
    let text = read_required(path)?;
    Ok(parse_corpus(&text, words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probabilistic_rules() {
        let grammar = build_grammar(
            "S\nA\nB\n",
            None,
            Some("S -> A B 1.0\nA -> a 1.0\nB -> b 1.0\n"),
            None,
        )
        .unwrap();

        assert_eq!(grammar.binary.len(), 1);
        assert_eq!(grammar.unary.len(), 2);
        assert_eq!(grammar.binary[0].prob, 1.0);
        assert_eq!(grammar.nonterminals.get("S"), Some(0));
    }

    #[test]
    fn test_unannotated_rules_get_uniform_priors() {
        let grammar = build_grammar(
            "S\nA\nB\n",
            None,
            Some("S -> A B\nS -> B A\nA -> a\nB -> b\n"),
            None,
        )
        .unwrap();

        assert_eq!(grammar.binary.len(), 2);
        assert_eq!(grammar.binary[0].prob, 0.5);
        assert_eq!(grammar.binary[1].prob, 0.5);
        assert_eq!(grammar.unary[0].prob, 1.0);
        assert_eq!(grammar.unary[1].prob, 1.0);
    }

    #[test]
    fn test_mixed_annotation_rejected() {
        let err = build_grammar("S\nA\nB\n", None, Some("S -> A B 1.0\nA -> a\n"), None)
            .unwrap_err();
        assert!(matches!(err, GrammarError::MalformedGrammar { line: 2, .. }));
    }

    #[test]
    fn test_probability_above_one_rejected() {
        let err =
            build_grammar("S\nA\nB\n", None, Some("S -> A B 1.5\n"), None).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::InvalidProbability { line: 1, .. }
        ));
    }

    #[test]
    fn test_zero_probability_binary_rules_dropped() {
        let grammar = build_grammar(
            "S\nA\nB\n",
            None,
            Some("S -> A B 0.5\nS -> B A 0.0\nA -> a 1.0\n"),
            None,
        )
        .unwrap();

        assert_eq!(grammar.binary.len(), 1);
        assert_eq!((grammar.binary[0].left, grammar.binary[0].right), (1, 2));
    }

    #[test]
    fn test_generated_grammar_without_pcfg() {
        // 3 nonterminals, 2 terminals: 27 binary rules at 1/((3-1)(3-2)),
        // 6 lexical rules at 1/2.
        let grammar = build_grammar("S\nA\nB\n", Some("a\nb\n"), None, None).unwrap();

        assert_eq!(grammar.binary.len(), 27);
        assert!(grammar.binary.iter().all(|r| r.prob == 0.5));
        assert_eq!(grammar.unary.len(), 6);
        assert!(grammar.unary.iter().all(|r| r.prob == 0.5));
    }

    #[test]
    fn test_pos_rules_zero_preterminal_binaries() {
        // A and B become preterminals: their 9 binary rules each are zeroed
        // and dropped, leaving only the 9 headed by S.
        let grammar = build_grammar(
            "S\nA\nB\n",
            None,
            None,
            Some("A -> a 1.0\nB -> b 1.0\n"),
        )
        .unwrap();

        assert_eq!(grammar.unary.len(), 2);
        assert_eq!(grammar.binary.len(), 9);
        assert!(grammar.binary.iter().all(|r| r.lhs == 0));
    }

    #[test]
    fn test_pos_rules_uniform_priors() {
        let grammar =
            build_grammar("S\nA\n", None, None, Some("A -> a\nA -> b\n")).unwrap();
        assert_eq!(grammar.unary.len(), 2);
        assert!(grammar.unary.iter().all(|r| r.prob == 0.5));
    }

    #[test]
    fn test_parse_corpus_skips_blank_lines() {
        let mut words = SymbolTable::new();
        let corpus = parse_corpus("a b\n\n  \nb a\n", &mut words);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].len(), 2);
        assert_eq!(corpus[1], vec![words.get("b").unwrap(), words.get("a").unwrap()]);
    }

    #[test]
    fn test_missing_nonterminals_file() {
        let err = load_grammar(Path::new("/nonexistent-training-dir")).unwrap_err();
        assert!(matches!(err, GrammarError::MissingInput(_)));
    }
}
