//! Outside probability chart construction.
//!
//! `outside[i][j][A]` is the probability of deriving the whole sentence with
//! everything outside span i..=j generated around an A constituent over that
//! span. Computed top-down by decreasing span length, starting from the
//! boundary condition `outside[0][n-1][start] = 1.0`, which holds by
//! definition whatever the rule set contains.

use crate::chart::SpanChart;
use crate::grammar::{BinaryRule, RuleIndex};
use crate::symbol::NtId;

/// Build the outside chart for one sentence.
///
/// `inside` is the inside chart of the same sentence; `index` must have been
/// built from `binary`.
pub fn outside_chart(
    inside: &SpanChart,
    binary: &[BinaryRule],
    index: &RuleIndex,
    start: NtId,
) -> SpanChart {
    let n = inside.len();
    let mut chart = SpanChart::new(n);
    if n == 0 {
        return chart;
    }

    chart.add(0, n - 1, start, 1.0);

    let mut acc = vec![0.0f64; binary.len()];
    let mut touched: Vec<usize> = Vec::new();

    for len in (0..n).rev() {
        for i in 0..n - len {
            let j = i + len;

            // Right-sibling case: span (i, j) is the left child A of some
            // X -> A Y with an enclosing span (i, e). Rules with identical
            // children (Y == A) are skipped here, matching the recurrence.
            for e in j + 1..n {
                for (&parent, &out_p) in chart.cell(i, e) {
                    for &ridx in index.with_lhs(parent) {
                        let rule = &binary[ridx];
                        if rule.left == rule.right {
                            continue;
                        }
                        if let Some(in_p) = inside.get(j + 1, e, rule.right) {
                            if acc[ridx] == 0.0 {
                                touched.push(ridx);
                            }
                            acc[ridx] += rule.prob * out_p * in_p;
                        }
                    }
                }
            }
            flush(&mut chart, i, j, binary, &mut acc, &mut touched, Child::Left);

            // Left-sibling case: span (i, j) is the right child A of some
            // X -> Y A with an enclosing span (e, j), e < i.
            for e in 0..i {
                for (&parent, &out_p) in chart.cell(e, j) {
                    for &ridx in index.with_lhs(parent) {
                        let rule = &binary[ridx];
                        if let Some(in_p) = inside.get(e, i - 1, rule.left) {
                            if acc[ridx] == 0.0 {
                                touched.push(ridx);
                            }
                            acc[ridx] += rule.prob * out_p * in_p;
                        }
                    }
                }
            }
            flush(&mut chart, i, j, binary, &mut acc, &mut touched, Child::Right);
        }
    }

    chart
}

enum Child {
    Left,
    Right,
}

/// Move aggregated per-rule sums into the chart cell, skipping exact zeros.
fn flush(
    chart: &mut SpanChart,
    i: usize,
    j: usize,
    binary: &[BinaryRule],
    acc: &mut [f64],
    touched: &mut Vec<usize>,
    child: Child,
) {
    touched.sort_unstable();
    for &ridx in touched.iter() {
        let sum = acc[ridx];
        if sum > 0.0 {
            let nt = match child {
                Child::Left => binary[ridx].left,
                Child::Right => binary[ridx].right,
            };
            chart.add(i, j, nt, sum);
        }
        acc[ridx] = 0.0;
    }
    touched.clear();
}
