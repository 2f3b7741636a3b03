//! EM re-estimation of binary rule probabilities.
//!
//! One sentence's inside and outside charts yield expected counts for every
//! binary rule; the quotient of rule mass over left-hand-side mass is the
//! rule's re-estimated probability. Unary rules are fixed inputs in this
//! algorithm variant and pass through untouched.

use crate::chart::SpanChart;
use crate::grammar::BinaryRule;
use crate::symbol::NtId;
use rustc_hash::FxHashMap;

/// Re-estimate binary rule probabilities from one sentence's charts.
///
/// Returns a new rule list positionally aligned with the input. A zero
/// denominator (the lhs never occurs as a constituent) defines the quotient
/// as 0.0, and an exactly-zero re-estimate retains the rule's previous
/// probability: a single unsupportive sentence must not zero a rule out
/// mid-pass. That retention is a stabilization policy, not error handling.
pub fn reestimate(
    inside: &SpanChart,
    outside: &SpanChart,
    binary: &[BinaryRule],
) -> Vec<BinaryRule> {
    let n = inside.len();

    // The denominator only depends on the rule's lhs: total inside * outside
    // mass of that nonterminal over all spans. Compute it once per sentence.
    let mut lhs_mass: FxHashMap<NtId, f64> = FxHashMap::default();
    for i in 0..n {
        for j in i..n {
            for (&nt, &ins) in inside.cell(i, j) {
                if let Some(out) = outside.get(i, j, nt) {
                    *lhs_mass.entry(nt).or_insert(0.0) += out * ins;
                }
            }
        }
    }

    let mut updated = Vec::with_capacity(binary.len());
    for rule in binary {
        let mut numerator = 0.0;
        for i in 0..n {
            for j in i + 1..n {
                if let Some(out) = outside.get(i, j, rule.lhs) {
                    let mut inside_sum = 0.0;
                    for d in i..j {
                        if let (Some(left_p), Some(right_p)) =
                            (inside.get(i, d, rule.left), inside.get(d + 1, j, rule.right))
                        {
                            inside_sum += left_p * right_p;
                        }
                    }
                    numerator += inside_sum * (out * rule.prob);
                }
            }
        }

        let denominator = lhs_mass.get(&rule.lhs).copied().unwrap_or(0.0);
        let mut new_prob = if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        };
        if new_prob == 0.0 {
            new_prob = rule.prob;
        }

        updated.push(BinaryRule {
            prob: new_prob,
            ..*rule
        });
    }

    updated
}

/// Maximum absolute probability change between two positionally aligned rule
/// lists. Zero when a list is compared against itself.
pub fn check_improvement(old: &[BinaryRule], new: &[BinaryRule]) -> f64 {
    debug_assert_eq!(old.len(), new.len(), "rule lists must stay aligned");

    let mut max_delta = 0.0f64;
    for (old_rule, new_rule) in old.iter().zip(new) {
        let delta = (old_rule.prob - new_rule.prob).abs();
        if delta > max_delta {
            max_delta = delta;
        }
    }
    max_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RuleIndex, UnaryRule};
    use crate::inside::inside_chart;
    use crate::outside::outside_chart;

    const S: u32 = 0;
    const A: u32 = 1;
    const B: u32 = 2;

    fn unary(lhs: u32, word: u32, prob: f64) -> UnaryRule {
        UnaryRule { lhs, word, prob }
    }

    fn binary(lhs: u32, left: u32, right: u32, prob: f64) -> BinaryRule {
        BinaryRule {
            lhs,
            left,
            right,
            prob,
        }
    }

    fn charts(
        sentence: &[u32],
        unary_rules: &[UnaryRule],
        binary_rules: &[BinaryRule],
    ) -> (SpanChart, SpanChart) {
        let index = RuleIndex::build(binary_rules);
        let inside = inside_chart(sentence, unary_rules, binary_rules, &index);
        let outside = outside_chart(&inside, binary_rules, &index, S);
        (inside, outside)
    }

    #[test]
    fn test_deterministic_rule_stays_at_one() {
        let unary_rules = vec![unary(A, 0, 1.0), unary(B, 1, 1.0)];
        let binary_rules = vec![binary(S, A, B, 1.0)];
        let (inside, outside) = charts(&[0, 1], &unary_rules, &binary_rules);

        let updated = reestimate(&inside, &outside, &binary_rules);
        assert_eq!(updated[0].prob, 1.0);
        assert_eq!(check_improvement(&binary_rules, &updated), 0.0);
    }

    #[test]
    fn test_attested_rule_gains_unattested_retained() {
        // "a b" supports S -> A B but not S -> B A; the competing rule's
        // expected count is exactly zero, so it keeps its prior.
        let unary_rules = vec![unary(A, 0, 1.0), unary(B, 1, 1.0)];
        let binary_rules = vec![binary(S, A, B, 0.5), binary(S, B, A, 0.5)];
        let (inside, outside) = charts(&[0, 1], &unary_rules, &binary_rules);

        let updated = reestimate(&inside, &outside, &binary_rules);
        assert!(updated[0].prob > 0.5);
        assert_eq!(updated[1].prob, 0.5);
    }

    #[test]
    fn test_zero_denominator_retains_prior() {
        // A rule whose lhs never appears in either chart: denominator is
        // zero, quotient defined as 0.0, prior retained.
        let x = 7;
        let unary_rules = vec![unary(A, 0, 1.0), unary(B, 1, 1.0)];
        let binary_rules = vec![binary(S, A, B, 1.0), binary(x, A, B, 0.25)];
        let (inside, outside) = charts(&[0, 1], &unary_rules, &binary_rules);

        let updated = reestimate(&inside, &outside, &binary_rules);
        assert_eq!(updated[1].prob, 0.25);
    }

    #[test]
    fn test_rule_at_zero_stays_at_zero() {
        // Retention hands back the previous probability, so a rule entering
        // at exactly 0.0 leaves at exactly 0.0.
        let unary_rules = vec![unary(A, 0, 1.0), unary(B, 1, 1.0)];
        let binary_rules = vec![binary(S, A, B, 1.0), binary(S, B, A, 0.0)];
        let (inside, outside) = charts(&[0, 1], &unary_rules, &binary_rules);

        let updated = reestimate(&inside, &outside, &binary_rules);
        assert_eq!(updated[1].prob, 0.0);
    }

    #[test]
    fn test_check_improvement_idempotent() {
        let rules = vec![binary(S, A, B, 0.5), binary(S, B, A, 0.125)];
        assert_eq!(check_improvement(&rules, &rules), 0.0);
    }

    #[test]
    fn test_check_improvement_max_delta() {
        let old = vec![binary(S, A, B, 0.5), binary(S, B, A, 0.5)];
        let new = vec![binary(S, A, B, 0.9), binary(S, B, A, 0.45)];
        assert!((check_improvement(&old, &new) - 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_output_positionally_aligned() {
        let unary_rules = vec![unary(A, 0, 1.0), unary(B, 1, 1.0)];
        let binary_rules = vec![binary(S, B, A, 0.5), binary(S, A, B, 0.5)];
        let (inside, outside) = charts(&[0, 1], &unary_rules, &binary_rules);

        let updated = reestimate(&inside, &outside, &binary_rules);
        assert_eq!(updated.len(), 2);
        assert_eq!((updated[0].left, updated[0].right), (B, A));
        assert_eq!((updated[1].left, updated[1].right), (A, B));
    }
}
