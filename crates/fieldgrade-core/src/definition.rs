//! TOML exercise definitions.
//!
//! Loads exercise definitions from TOML files and directories, validates
//! them, and builds the evaluators they describe.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assertions::{AssertionEngine, Expected, DEFAULT_ENTRY_POINTS, EXPECTED_VALUE_TOKEN};
use crate::error::{ConfigResult, ConfigurationError};
use crate::format::parse_date_time;
use crate::rules::{Rule, RuleEvaluator, RuleType};

/// A complete exercise: its header plus every rule and entry it registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub exercise: ExerciseHeader,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    #[serde(default)]
    pub entries: Vec<EntryDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseHeader {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Keys whose statistics add up when team evaluators are merged.
    #[serde(default)]
    pub summable_keys: Vec<String>,
}

/// One `[[rules]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub key: String,
    pub label: String,
    /// Rule type name, e.g. `REQUIRED` or `DATE_TIME_NOT`.
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub points: u32,
}

/// One `[[entries]]` table. At most one `expected*` field may be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDefinition {
    pub key: String,
    pub label: String,
    #[serde(default = "default_entry_points")]
    pub points: u32,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub expected_any: Option<Vec<String>>,
    #[serde(default)]
    pub expected_date_time: Option<String>,
}

fn default_entry_points() -> u32 {
    DEFAULT_ENTRY_POINTS
}

impl RuleDefinition {
    pub fn to_rule(&self) -> ConfigResult<Rule> {
        let rule_type: RuleType = self.rule_type.parse()?;
        let rule = Rule::new(&self.label, rule_type, self.points);
        Ok(match &self.placeholder {
            Some(p) => rule.with_placeholder(p),
            None => rule,
        })
    }
}

impl EntryDefinition {
    pub fn to_expected(&self) -> ConfigResult<Expected> {
        match (&self.expected, &self.expected_any, &self.expected_date_time) {
            (None, None, None) => Ok(Expected::None),
            (Some(text), None, None) => Ok(Expected::Text(text.clone())),
            (None, Some(candidates), None) => Ok(Expected::AnyOf(candidates.clone())),
            (None, None, Some(raw)) => parse_date_time(raw).map(Expected::DateTime).ok_or_else(|| {
                ConfigurationError::InvalidDefinition {
                    key: self.key.clone(),
                    message: format!("expected_date_time '{raw}' is not yyyy-MM-dd HH:mm"),
                }
            }),
            _ => Err(ConfigurationError::InvalidDefinition {
                key: self.key.clone(),
                message: "only one of expected, expected_any, expected_date_time may be set"
                    .into(),
            }),
        }
    }
}

impl ExerciseDefinition {
    /// Build a rule evaluator holding every `[[rules]]` table, in file order.
    pub fn build_evaluator(&self) -> ConfigResult<RuleEvaluator> {
        let mut evaluator = RuleEvaluator::new();
        for def in &self.rules {
            evaluator.add_rule(def.key.clone(), def.to_rule()?)?;
        }
        Ok(evaluator)
    }

    /// Build an assertion engine holding every `[[entries]]` table, in file order.
    pub fn build_assertion_engine(&self) -> ConfigResult<AssertionEngine> {
        let mut engine = AssertionEngine::new();
        for def in &self.entries {
            engine.add_scored_entry(def.key.clone(), def.label.clone(), def.to_expected()?, def.points);
        }
        Ok(engine)
    }
}

/// Parse a single TOML file into an [`ExerciseDefinition`].
pub fn parse_exercise(path: &Path) -> Result<ExerciseDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise file: {}", path.display()))?;

    parse_exercise_str(&content, path)
}

/// Parse a TOML string into an [`ExerciseDefinition`].
pub fn parse_exercise_str(content: &str, source_path: &Path) -> Result<ExerciseDefinition> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// Recursively load all `.toml` exercise files from a directory.
pub fn load_exercise_directory(dir: &Path) -> Result<Vec<ExerciseDefinition>> {
    let mut exercises = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            exercises.extend(load_exercise_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exercise(&path) {
                Ok(exercise) => exercises.push(exercise),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exercises)
}

/// Load one file, or every exercise under a directory.
pub fn load_exercises(path: &Path) -> Result<Vec<ExerciseDefinition>> {
    if path.is_dir() {
        load_exercise_directory(path)
    } else {
        Ok(vec![parse_exercise(path)?])
    }
}

/// A non-fatal problem found in an exercise definition.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The rule or entry key (if applicable).
    pub key: Option<String>,
    pub message: String,
}

/// Check an exercise for suspicious but legal configuration.
///
/// Hard configuration errors surface from [`ExerciseDefinition::build_evaluator`]
/// and [`ExerciseDefinition::build_assertion_engine`] instead.
pub fn validate_exercise(def: &ExerciseDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for rule in &def.rules {
        if !seen.insert(rule.key.as_str()) {
            warnings.push(ValidationWarning {
                key: Some(rule.key.clone()),
                message: format!("duplicate rule key: {} (later definition wins)", rule.key),
            });
        }
    }

    let mut seen_entries = HashSet::new();
    for entry in &def.entries {
        if !seen_entries.insert(entry.key.as_str()) {
            warnings.push(ValidationWarning {
                key: Some(entry.key.clone()),
                message: format!("duplicate entry key: {} (later definition wins)", entry.key),
            });
        }
    }

    for key in &def.exercise.summable_keys {
        if !seen.contains(key.as_str()) {
            warnings.push(ValidationWarning {
                key: Some(key.clone()),
                message: format!("summable key {key} names no rule"),
            });
        }
    }

    for rule in &def.rules {
        if rule.points == 0 {
            warnings.push(ValidationWarning {
                key: Some(rule.key.clone()),
                message: "rule awards zero points".into(),
            });
        }
    }

    for entry in &def.entries {
        if entry.label.contains(EXPECTED_VALUE_TOKEN) && entry.expected.is_none() {
            warnings.push(ValidationWarning {
                key: Some(entry.key.clone()),
                message: format!(
                    "label contains {EXPECTED_VALUE_TOKEN} but there is no text expectation to substitute"
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exercise]
id = "ics-213-weekly"
name = "ICS-213 weekly check-in"
description = "Weekly general message practice"
summable_keys = ["count"]

[[rules]]
key = "callsign"
label = "Callsign"
type = "REQUIRED"
points = 10

[[rules]]
key = "date"
label = "Date/Time"
type = "DATE_TIME_NOT"
placeholder = "UNKNOWN"
points = 5

[[rules]]
key = "count"
label = "Count"
type = "OPTIONAL"

[[entries]]
key = "subject"
label = "Subject must be #EV"
expected = "Weekly Check In"

[[entries]]
key = "band"
label = "Band"
points = 2
expected_any = ["2m", "70cm"]

[[entries]]
key = "sent"
label = "Sent on time"
expected_date_time = "2024-06-01 18:00"
"#;

    fn parse(toml: &str) -> ExerciseDefinition {
        parse_exercise_str(toml, &PathBuf::from("test.toml")).unwrap()
    }

    #[test]
    fn parse_valid_toml() {
        let def = parse(VALID_TOML);
        assert_eq!(def.exercise.id, "ics-213-weekly");
        assert_eq!(def.rules.len(), 3);
        assert_eq!(def.entries.len(), 3);
        assert_eq!(def.rules[2].points, 0);
        assert_eq!(def.entries[0].points, 1);
        assert_eq!(def.exercise.summable_keys, vec!["count"]);
    }

    #[test]
    fn builds_engines_in_file_order() {
        let def = parse(VALID_TOML);
        let evaluator = def.build_evaluator().unwrap();
        assert_eq!(
            evaluator.keys().collect::<Vec<_>>(),
            vec!["callsign", "date", "count"]
        );
        assert_eq!(evaluator.max_points(), 15);

        let engine = def.build_assertion_engine().unwrap();
        assert_eq!(
            engine.entry("subject").unwrap().label,
            "Subject must be Weekly Check In"
        );
        assert!(matches!(
            engine.entry("sent").unwrap().expected,
            Expected::DateTime(_)
        ));
    }

    #[test]
    fn unsupported_rule_type_fails_fast() {
        let def = parse(
            r#"
[exercise]
id = "x"
name = "X"

[[rules]]
key = "k"
label = "K"
type = "EQUALS_IGNORE_CASE"
placeholder = "abc"
"#,
        );
        let err = def.build_evaluator().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsupportedRuleType(_)));
    }

    #[test]
    fn placeholder_mismatch_fails_fast() {
        let def = parse(
            r#"
[exercise]
id = "x"
name = "X"

[[rules]]
key = "k"
label = "K"
type = "SPECIFIED"
"#,
        );
        assert!(matches!(
            def.build_evaluator().unwrap_err(),
            ConfigurationError::MissingPlaceholder { .. }
        ));
    }

    #[test]
    fn conflicting_expectations_rejected() {
        let def = parse(
            r#"
[exercise]
id = "x"
name = "X"

[[entries]]
key = "k"
label = "K"
expected = "a"
expected_any = ["a", "b"]
"#,
        );
        assert!(matches!(
            def.build_assertion_engine().unwrap_err(),
            ConfigurationError::InvalidDefinition { .. }
        ));
    }

    #[test]
    fn bad_date_time_expectation_rejected() {
        let def = parse(
            r#"
[exercise]
id = "x"
name = "X"

[[entries]]
key = "k"
label = "K"
expected_date_time = "June 1st"
"#,
        );
        let err = def.build_assertion_engine().unwrap_err();
        assert!(err.to_string().contains("June 1st"));
    }

    #[test]
    fn validate_reports_warnings() {
        let def = parse(
            r#"
[exercise]
id = "x"
name = "X"
summable_keys = ["missing"]

[[rules]]
key = "a"
label = "A"
type = "REQUIRED"
points = 1

[[rules]]
key = "a"
label = "A again"
type = "OPTIONAL"

[[entries]]
key = "e"
label = "should be #EV"
"#,
        );
        let warnings = validate_exercise(&def);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate rule key")));
        assert!(warnings.iter().any(|w| w.message.contains("names no rule")));
        assert!(warnings.iter().any(|w| w.message.contains("zero points")));
        assert!(warnings.iter().any(|w| w.message.contains("#EV")));
    }

    #[test]
    fn valid_exercise_has_no_warnings_except_zero_points() {
        let def = parse(VALID_TOML);
        let warnings = validate_exercise(&def);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key.as_deref(), Some("count"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_exercise_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weekly.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exercises = load_exercise_directory(dir.path()).unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].exercise.id, "ics-213-weekly");

        let single = load_exercises(&dir.path().join("weekly.toml")).unwrap();
        assert_eq!(single.len(), 1);
    }
}
