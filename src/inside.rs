//! Inside probability chart construction.
//!
//! `inside[i][j][A]` is the probability that nonterminal A derives the span
//! of tokens i..=j, summed over all derivations. Computed bottom-up by
//! increasing span length, CKY style.
//!
//! Arithmetic is plain f64 summation: no log-space and no underflow guard.
//! Grammars and sentences long enough to underflow silently lose precision;
//! that is a documented limitation of this algorithm variant.

use crate::chart::SpanChart;
use crate::grammar::{BinaryRule, RuleIndex, UnaryRule};
use crate::symbol::WordId;

/// Build the inside chart for one sentence under the given rule snapshot.
///
/// `index` must have been built from `binary`.
pub fn inside_chart(
    sentence: &[WordId],
    unary: &[UnaryRule],
    binary: &[BinaryRule],
    index: &RuleIndex,
) -> SpanChart {
    let n = sentence.len();
    let mut chart = SpanChart::new(n);

    // Base case: lexical rules on the diagonal. Duplicate rules covering the
    // same (lhs, word) pair sum their probabilities.
    for (i, &word) in sentence.iter().enumerate() {
        for rule in unary {
            if rule.word == word {
                chart.add(i, i, rule.lhs, rule.prob);
            }
        }
    }

    // Inductive case by increasing span length. Per-rule contributions are
    // aggregated over all split points first; an aggregate of exactly zero
    // creates no cell entry.
    let mut acc = vec![0.0f64; binary.len()];
    let mut touched: Vec<usize> = Vec::new();

    for len in 1..n {
        for i in 0..n - len {
            let j = i + len;

            for d in i..j {
                for (&left_nt, &left_p) in chart.cell(i, d) {
                    for (&right_nt, &right_p) in chart.cell(d + 1, j) {
                        for &ridx in index.with_children(left_nt, right_nt) {
                            if acc[ridx] == 0.0 {
                                touched.push(ridx);
                            }
                            acc[ridx] += binary[ridx].prob * left_p * right_p;
                        }
                    }
                }
            }

            touched.sort_unstable();
            for &ridx in &touched {
                let sum = acc[ridx];
                if sum > 0.0 {
                    chart.add(i, j, binary[ridx].lhs, sum);
                }
                acc[ridx] = 0.0;
            }
            touched.clear();
        }
    }

    chart
}
