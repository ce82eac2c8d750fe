//! Per-rule and per-entry pass statistics.

use serde::{Deserialize, Serialize};

use crate::assertions::AssertionEngine;
use crate::grading::SubmissionResult;
use crate::rules::RuleEvaluator;

/// How often one rule or entry passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub key: String,
    pub label: String,
    /// Number of passing tests.
    pub passed: u64,
    /// Number of tests performed.
    pub observed: u64,
    /// `passed / observed`, or 0.0 when nothing was observed.
    pub pass_rate: f64,
    /// Distinct values seen.
    pub distinct_values: usize,
}

fn rate(passed: u64, observed: u64) -> f64 {
    if observed == 0 {
        0.0
    } else {
        passed as f64 / observed as f64
    }
}

/// Statistics for every rule, in registration order.
///
/// Every test records exactly one value, so the counter total is the number
/// of tests performed.
pub fn rule_statistics(evaluator: &RuleEvaluator) -> Vec<KeyStats> {
    evaluator
        .rules()
        .map(|(key, rule)| {
            let observed = rule.observed_values().value_total();
            KeyStats {
                key: key.to_string(),
                label: rule.label.clone(),
                passed: rule.pass_count(),
                observed,
                pass_rate: rate(rule.pass_count(), observed),
                distinct_values: rule.observed_values().key_count(),
            }
        })
        .collect()
}

/// Statistics for every entry, in registration order.
pub fn entry_statistics(engine: &AssertionEngine) -> Vec<KeyStats> {
    engine
        .entries()
        .map(|(key, entry)| KeyStats {
            key: key.to_string(),
            label: entry.label.clone(),
            passed: entry.pass_count(),
            observed: entry.total_count(),
            pass_rate: rate(entry.pass_count(), entry.total_count()),
            distinct_values: entry.observed_values().key_count(),
        })
        .collect()
}

/// Mean points over graded submissions; 0.0 for an empty batch.
pub fn average_points(results: &[SubmissionResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.points as f64).sum::<f64>() / results.len() as f64
}

/// Number of submissions that passed every rule.
pub fn perfect_count(results: &[SubmissionResult]) -> usize {
    results.iter().filter(|r| r.is_perfect()).count()
}
