//! Typed field rules and the rule evaluator.
//!
//! A [`RuleEvaluator`] owns one [`Rule`] per field key. Each submission is
//! graded by calling [`RuleEvaluator::reset`] and then
//! [`RuleEvaluator::test`] once per field; the caller reads back the point
//! total and the explanations of every failed rule.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::counter::FrequencyCounter;
use crate::error::{ConfigResult, ConfigurationError};
use crate::format::{
    contains_ignore_case, equals_ignore_case, is_blank, parse_date_time, wrap,
};

/// Rule type names that exist in exercise files but carry no evaluation semantics.
const UNSUPPORTED_RULE_TYPES: &[&str] = &[
    "CONTAINED_BY",
    "LIST",
    "EQUALS",
    "EQUALS_IGNORE_CASE",
    "DOUBLE",
];

/// What a rule checks. String comparisons are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    /// Value must be present and not blank.
    Required,
    /// As `Required`, and the value must differ from the placeholder.
    RequiredNot,
    /// Always passes; the value is only counted.
    Optional,
    /// Value may be missing, but must differ from the placeholder.
    OptionalNot,
    /// Value must contain the placeholder.
    Contains,
    /// Value must equal the placeholder.
    Specified,
    /// Value must be missing or blank.
    Empty,
    /// Value must parse as `yyyy-MM-dd HH:mm`.
    DateTime,
    /// Value must differ from the placeholder and parse as `yyyy-MM-dd HH:mm`.
    DateTimeNot,
}

impl RuleType {
    pub const ALL: [RuleType; 9] = [
        RuleType::Required,
        RuleType::RequiredNot,
        RuleType::Optional,
        RuleType::OptionalNot,
        RuleType::Contains,
        RuleType::Specified,
        RuleType::Empty,
        RuleType::DateTime,
        RuleType::DateTimeNot,
    ];

    /// Whether rules of this type compare against a placeholder.
    pub fn needs_placeholder(self) -> bool {
        match self {
            RuleType::RequiredNot
            | RuleType::OptionalNot
            | RuleType::Contains
            | RuleType::Specified
            | RuleType::DateTimeNot => true,
            RuleType::Required | RuleType::Optional | RuleType::Empty | RuleType::DateTime => {
                false
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::Required => "REQUIRED",
            RuleType::RequiredNot => "REQUIRED_NOT",
            RuleType::Optional => "OPTIONAL",
            RuleType::OptionalNot => "OPTIONAL_NOT",
            RuleType::Contains => "CONTAINS",
            RuleType::Specified => "SPECIFIED",
            RuleType::Empty => "EMPTY",
            RuleType::DateTime => "DATE_TIME",
            RuleType::DateTimeNot => "DATE_TIME_NOT",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        RuleType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                if UNSUPPORTED_RULE_TYPES.contains(&normalized.as_str()) {
                    ConfigurationError::UnsupportedRuleType(format!(
                        "{normalized} (recognised, but has no evaluation semantics)"
                    ))
                } else {
                    ConfigurationError::UnsupportedRuleType(s.to_string())
                }
            })
    }
}

/// A registered field rule and the statistics gathered for it.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Human-readable field name used in explanations.
    pub label: String,
    pub rule_type: RuleType,
    /// Reference value for the types that compare against one.
    pub placeholder: Option<String>,
    /// Points awarded when the rule passes.
    pub points: u32,
    pass_count: u64,
    observed: FrequencyCounter<String>,
}

impl Rule {
    pub fn new(label: impl Into<String>, rule_type: RuleType, points: u32) -> Self {
        Self {
            label: label.into(),
            rule_type,
            placeholder: None,
            points,
            pass_count: 0,
            observed: FrequencyCounter::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Number of submissions that passed this rule.
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    /// Every value tested against this rule, failures included.
    pub fn observed_values(&self) -> &FrequencyCounter<String> {
        &self.observed
    }

    /// The definition alone, with fresh statistics.
    pub fn definition(&self) -> Rule {
        Rule {
            pass_count: 0,
            observed: FrequencyCounter::new(),
            ..self.clone()
        }
    }

    fn has_placeholder(&self) -> bool {
        !is_blank(self.placeholder.as_deref())
    }

    fn validate(&self, key: &str) -> ConfigResult<()> {
        match (self.rule_type.needs_placeholder(), self.has_placeholder()) {
            (true, false) => Err(ConfigurationError::MissingPlaceholder {
                key: key.to_string(),
                rule_type: self.rule_type.to_string(),
            }),
            (false, true) => Err(ConfigurationError::UnexpectedPlaceholder {
                key: key.to_string(),
                rule_type: self.rule_type.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Explanation of why `value` fails this rule, or `None` if it passes.
    fn failure(&self, value: Option<&str>) -> Option<String> {
        let label = &self.label;
        let shown = wrap(value);
        let placeholder = self.placeholder.as_deref().unwrap_or_default();
        let matches_placeholder = value.is_some_and(|v| equals_ignore_case(v, placeholder));

        match self.rule_type {
            RuleType::Required => required_failure(label, value),
            RuleType::RequiredNot => required_failure(label, value).or_else(|| {
                matches_placeholder.then(|| format!("{label}({shown}) must not be {placeholder}"))
            }),
            RuleType::Optional => None,
            RuleType::OptionalNot => {
                matches_placeholder.then(|| format!("{label}({shown}) must not be {placeholder}"))
            }
            RuleType::Contains => {
                let contains = value.is_some_and(|v| contains_ignore_case(v, placeholder));
                (!contains).then(|| format!("{label} must contain {placeholder}"))
            }
            RuleType::Specified => {
                (!matches_placeholder).then(|| format!("{label}({shown}) must be {placeholder}"))
            }
            RuleType::Empty => (!is_blank(value)).then(|| format!("{label}({shown}) must be blank")),
            RuleType::DateTime => date_time_failure(label, value),
            RuleType::DateTimeNot => {
                if matches_placeholder {
                    Some(format!("{label}({shown}) must not be {placeholder}"))
                } else {
                    date_time_failure(label, value)
                }
            }
        }
    }
}

fn required_failure(label: &str, value: Option<&str>) -> Option<String> {
    match value {
        None => Some(format!("{label} must be supplied")),
        Some(v) if v.trim().is_empty() => Some(format!("{label}({}) must not be blank", wrap(value))),
        Some(_) => None,
    }
}

fn date_time_failure(label: &str, value: Option<&str>) -> Option<String> {
    match value.and_then(parse_date_time) {
        Some(_) => None,
        None => Some(format!("{label}({}) is not a valid Date/Time", wrap(value))),
    }
}

/// Evaluates submitted field values against registered rules.
///
/// Rule definitions and their counters live for the whole grading run;
/// the point total and explanation sink are per submission.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    rules: IndexMap<String, Rule>,
    explanations: Vec<String>,
    points: u32,
    enabled: bool,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
            explanations: Vec::new(),
            points: 0,
            enabled: true,
        }
    }

    /// Register `rule` under `key`, replacing any rule already there.
    ///
    /// Fails if the rule's placeholder does not fit its type.
    pub fn add_rule(&mut self, key: impl Into<String>, rule: Rule) -> ConfigResult<()> {
        let key = key.into();
        rule.validate(&key)?;
        tracing::debug!(key = %key, rule_type = %rule.rule_type, points = rule.points, "rule registered");
        self.rules.insert(key, rule);
        Ok(())
    }

    /// Start a new submission: fresh explanation sink, zero points.
    pub fn reset(&mut self) {
        self.explanations = Vec::new();
        self.points = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Test `value` against the rule registered under `key`.
    ///
    /// Returns the points earned: the rule's points on a pass, zero on a
    /// failure (with an explanation appended). A disabled evaluator returns
    /// zero and records nothing.
    pub fn test(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        if !self.enabled {
            return Ok(0);
        }

        let rule = self
            .rules
            .get_mut(key)
            .ok_or_else(|| ConfigurationError::UnregisteredKey(key.to_string()))?;

        rule.observed.increment_null_safe(value);

        match rule.failure(value) {
            None => {
                rule.pass_count += 1;
                self.points = self.points.saturating_add(rule.points);
                Ok(rule.points)
            }
            Some(explanation) => {
                self.explanations.push(explanation);
                Ok(0)
            }
        }
    }

    /// Fold the statistics of `sub_evaluators` into this one.
    ///
    /// Rules missing here are copied (definition only) from the first
    /// sub-evaluator that has them. For keys in `summable_keys`, pass counts
    /// and counters are added up; for all other keys the last sub-evaluator
    /// in slice order wins.
    pub fn merge<S: AsRef<str>>(&mut self, sub_evaluators: &[&RuleEvaluator], summable_keys: &[S]) {
        let is_summable = |key: &str| summable_keys.iter().any(|k| k.as_ref() == key);
        let mut merged = self.rules.clone();

        for sub in sub_evaluators {
            for (key, rule) in &sub.rules {
                let target = merged
                    .entry(key.clone())
                    .or_insert_with(|| rule.definition());
                if is_summable(key) {
                    target.pass_count += rule.pass_count;
                    target.observed.merge(&rule.observed);
                } else {
                    target.pass_count = rule.pass_count;
                    target.observed = rule.observed.clone();
                }
            }
        }

        tracing::debug!(
            sources = sub_evaluators.len(),
            rules = merged.len(),
            "merged rule evaluators"
        );
        self.rules = merged;
    }

    /// Every rule's observed values, most frequent first.
    pub fn format_counters(&self) -> String {
        let mut out = String::new();
        for (key, rule) in &self.rules {
            out.push_str(&format!("{key} ({}):\n", rule.label));
            for (value, count) in rule.observed.by_count_descending() {
                out.push_str(&format!("  value: {value}, count: {count}\n"));
            }
        }
        out
    }

    pub fn rule(&self, key: &str) -> ConfigResult<&Rule> {
        self.rules
            .get(key)
            .ok_or_else(|| ConfigurationError::UnregisteredKey(key.to_string()))
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Points earned by the current submission.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Points a submission passing every rule would earn.
    pub fn max_points(&self) -> u32 {
        self.rules
            .values()
            .fold(0, |total, rule| total.saturating_add(rule.points))
    }

    pub fn explanations(&self) -> &[String] {
        &self.explanations
    }

    /// Hand the current explanations to the caller, leaving an empty sink.
    pub fn take_explanations(&mut self) -> Vec<String> {
        std::mem::take(&mut self.explanations)
    }
}
