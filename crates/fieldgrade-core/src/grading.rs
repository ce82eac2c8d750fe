//! Grading driver: feeds submissions through a rule evaluator and an
//! assertion engine.
//!
//! Each submission is graded with `reset()` followed by one `test()` per
//! registered rule, then one default test per registered entry. Team
//! evaluators graded separately can be folded into one set of statistics
//! with [`merge_teams`].

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assertions::AssertionEngine;
use crate::error::ConfigResult;
use crate::rules::RuleEvaluator;

/// One exercise message, already parsed into field values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    /// Identifies the submission in reports (message id, sender, ...).
    pub id: String,
    /// Field values by rule key. Missing keys and JSON `null` are treated as absent.
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
}

impl Submission {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Some(value.into()));
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub id: String,
    pub points: u32,
    pub max_points: u32,
    /// Why each failed rule or entry failed: rules first, then entries, each in registration order.
    pub explanations: Vec<String>,
}

impl SubmissionResult {
    pub fn is_perfect(&self) -> bool {
        self.explanations.is_empty()
    }
}

/// Grade one submission against every rule registered in `evaluator`.
pub fn grade_submission(
    evaluator: &mut RuleEvaluator,
    submission: &Submission,
) -> ConfigResult<SubmissionResult> {
    evaluator.reset();

    let keys: Vec<String> = evaluator.keys().map(str::to_string).collect();
    for key in &keys {
        evaluator.test(key, submission.field(key))?;
    }

    let result = SubmissionResult {
        id: submission.id.clone(),
        points: evaluator.points(),
        max_points: evaluator.max_points(),
        explanations: evaluator.take_explanations(),
    };
    tracing::debug!(
        id = %result.id,
        points = result.points,
        failures = result.explanations.len(),
        "submission graded"
    );
    Ok(result)
}

/// Test every entry registered in `engine` against `submission` and add the
/// outcome to a rule-graded `result`.
pub fn grade_entries(
    engine: &mut AssertionEngine,
    submission: &Submission,
    result: &mut SubmissionResult,
) -> ConfigResult<()> {
    engine.reset();

    let keys: Vec<String> = engine.keys().map(str::to_string).collect();
    for key in &keys {
        engine.test_default(key, submission.field(key))?;
    }

    result.points = result.points.saturating_add(engine.points());
    result.max_points = result.max_points.saturating_add(engine.max_points());
    result.explanations.extend(engine.take_explanations());
    Ok(())
}

/// Grade a batch in order against rules and entries. Stops at the first
/// configuration error.
pub fn grade_all(
    evaluator: &mut RuleEvaluator,
    assertions: &mut AssertionEngine,
    submissions: &[Submission],
) -> ConfigResult<Vec<SubmissionResult>> {
    submissions
        .iter()
        .map(|s| {
            let mut result = grade_submission(evaluator, s)?;
            grade_entries(assertions, s, &mut result)?;
            Ok(result)
        })
        .collect()
}

/// Fold several team evaluators into a fresh evaluator.
pub fn merge_teams<S: AsRef<str>>(teams: &[&RuleEvaluator], summable_keys: &[S]) -> RuleEvaluator {
    let mut merged = RuleEvaluator::new();
    merged.merge(teams, summable_keys);
    merged
}

/// Load submissions from a JSON array file.
pub fn load_submissions(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::Expected;
    use crate::rules::{Rule, RuleType};

    fn evaluator() -> RuleEvaluator {
        let mut ev = RuleEvaluator::new();
        ev.add_rule("callsign", Rule::new("callsign", RuleType::Required, 10))
            .unwrap();
        ev.add_rule("date", Rule::new("date", RuleType::DateTime, 5))
            .unwrap();
        ev
    }

    #[test]
    fn grades_each_registered_field() {
        let mut ev = evaluator();
        let submission = Submission::new("msg-1")
            .with_field("callsign", "K1ABC")
            .with_field("date", "garbage");

        let result = grade_submission(&mut ev, &submission).unwrap();
        assert_eq!(result.points, 10);
        assert_eq!(result.max_points, 15);
        assert_eq!(result.explanations.len(), 1);
        assert!(result.explanations[0].contains("date"));
        assert!(result.explanations[0].contains("garbage"));
        assert!(!result.is_perfect());
    }

    #[test]
    fn missing_fields_are_absent() {
        let mut ev = evaluator();
        let result = grade_submission(&mut ev, &Submission::new("empty")).unwrap();
        assert_eq!(result.points, 0);
        assert_eq!(result.explanations[0], "callsign must be supplied");
    }

    #[test]
    fn batch_resets_between_submissions() {
        let mut ev = evaluator();
        let subs = vec![
            Submission::new("a").with_field("callsign", "K1ABC"),
            Submission::new("b")
                .with_field("callsign", "W1AW")
                .with_field("date", "2024-01-01 10:00"),
        ];
        let results = grade_all(&mut ev, &mut AssertionEngine::new(), &subs).unwrap();
        assert_eq!(results[0].points, 10);
        assert_eq!(results[1].points, 15);
        assert!(results[1].is_perfect());
        assert_eq!(ev.rule("callsign").unwrap().pass_count(), 2);
    }

    #[test]
    fn entries_add_points_and_explanations() {
        let mut ev = evaluator();
        let mut engine = AssertionEngine::new();
        engine.add_scored_entry("to", "To must be #EV", "W1AW", 3);
        engine.add_entry("location", "Location", Expected::None);

        let subs = vec![
            Submission::new("a")
                .with_field("callsign", "K1ABC")
                .with_field("to", "w1aw")
                .with_field("location", "Town hall"),
            Submission::new("b")
                .with_field("callsign", "K1ABC")
                .with_field("to", "N0CALL"),
        ];
        let results = grade_all(&mut ev, &mut engine, &subs).unwrap();

        assert_eq!(results[0].max_points, 19);
        assert_eq!(results[0].points, 14);
        assert_eq!(results[0].explanations, ["date((null)) is not a valid Date/Time"]);

        assert_eq!(results[1].points, 10);
        assert_eq!(
            results[1].explanations,
            [
                "date((null)) is not a valid Date/Time",
                "To must be W1AW, not N0CALL",
                "Location, not (null)",
            ]
        );
        assert_eq!(engine.entry("to").unwrap().total_count(), 2);
        assert_eq!(engine.entry("to").unwrap().pass_count(), 1);
    }

    #[test]
    fn submissions_parse_with_nulls() {
        let json = r#"[{"id": "m1", "fields": {"callsign": "K1ABC", "date": null}}, {"id": "m2"}]"#;
        let subs: Vec<Submission> = serde_json::from_str(json).unwrap();
        assert_eq!(subs[0].field("callsign"), Some("K1ABC"));
        assert_eq!(subs[0].field("date"), None);
        assert!(subs[1].fields.is_empty());
    }

    #[test]
    fn merge_teams_sums_summable() {
        let mut a = evaluator();
        let mut b = evaluator();
        grade_submission(&mut a, &Submission::new("a").with_field("callsign", "K1ABC")).unwrap();
        grade_submission(&mut b, &Submission::new("b").with_field("callsign", "W1AW")).unwrap();

        let merged = merge_teams(&[&a, &b], &["callsign"]);
        assert_eq!(merged.rule("callsign").unwrap().pass_count(), 2);
        assert_eq!(
            merged.rule("date").unwrap().observed_values().count_of("(null)"),
            Some(1)
        );
    }

    #[test]
    fn load_submissions_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, r#"[{"id": "x", "fields": {"callsign": "N0CALL"}}]"#).unwrap();
        let subs = load_submissions(&path).unwrap();
        assert_eq!(subs.len(), 1);
        assert!(load_submissions(&dir.path().join("missing.json")).is_err());
    }
}
