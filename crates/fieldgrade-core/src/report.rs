//! Grading report types with JSON persistence.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assertions::AssertionEngine;
use crate::definition::ExerciseDefinition;
use crate::grading::SubmissionResult;
use crate::rules::RuleEvaluator;
use crate::statistics::{average_points, entry_statistics, perfect_count, rule_statistics, KeyStats};

/// A complete grading report for one exercise run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exercise: ExerciseSummary,
    /// Number of team evaluators folded into the statistics.
    pub teams: usize,
    pub submissions: Vec<SubmissionResult>,
    /// Per-rule pass statistics.
    pub rules: Vec<KeyStats>,
    /// Per-entry pass statistics.
    #[serde(default)]
    pub entries: Vec<KeyStats>,
    /// Observed values per rule key, most frequent first.
    pub counters: IndexMap<String, Vec<CounterLine>>,
    pub total_points: u64,
}

/// Summary of an exercise (without the full rule definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: String,
    pub name: String,
    pub rule_count: usize,
    #[serde(default)]
    pub entry_count: usize,
    /// Rule and entry points combined.
    pub max_points: u32,
}

/// One observed value and how often it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterLine {
    pub value: String,
    pub count: u64,
}

impl fmt::Display for CounterLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value: {}, count: {}", self.value, self.count)
    }
}

impl GradingReport {
    /// Build a report from graded submissions, the (possibly merged)
    /// evaluator and the assertion engine the same submissions went through.
    pub fn build(
        exercise: &ExerciseDefinition,
        evaluator: &RuleEvaluator,
        assertions: &AssertionEngine,
        submissions: Vec<SubmissionResult>,
        teams: usize,
    ) -> Self {
        let counters: IndexMap<String, Vec<CounterLine>> = evaluator
            .rules()
            .map(|(key, rule)| {
                let lines: Vec<CounterLine> = rule
                    .observed_values()
                    .by_count_descending()
                    .into_iter()
                    .map(|(value, count)| CounterLine { value, count })
                    .collect();
                (key.to_string(), lines)
            })
            .collect();

        let total_points = submissions.iter().map(|s| s.points as u64).sum();

        GradingReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exercise: ExerciseSummary {
                id: exercise.exercise.id.clone(),
                name: exercise.exercise.name.clone(),
                rule_count: evaluator.len(),
                entry_count: assertions.len(),
                max_points: evaluator.max_points().saturating_add(assertions.max_points()),
            },
            teams,
            submissions,
            rules: rule_statistics(evaluator),
            entries: entry_statistics(assertions),
            counters,
            total_points,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn average_points(&self) -> f64 {
        average_points(&self.submissions)
    }

    pub fn perfect_count(&self) -> usize {
        perfect_count(&self.submissions)
    }

    /// Counter lines for one rule key.
    pub fn counter_lines(&self, key: &str) -> Option<&[CounterLine]> {
        self.counters.get(key).map(Vec::as_slice)
    }

    /// Render the counters as text, one block per rule.
    pub fn counters_text(&self, only_key: Option<&str>) -> String {
        let mut out = String::new();
        for stats in &self.rules {
            if only_key.is_some_and(|k| k != stats.key) {
                continue;
            }
            out.push_str(&format!("{} ({}):\n", stats.key, stats.label));
            for line in self.counter_lines(&stats.key).unwrap_or_default() {
                out.push_str(&format!("  {line}\n"));
            }
        }
        out
    }
}
