//! Data-driven assertion engine.
//!
//! Where a [`crate::rules::RuleEvaluator`] knows a fixed set of rule types,
//! the [`AssertionEngine`] lets each [`Entry`] carry an arbitrary expected
//! value and offers a family of predicates over it: a punctuation-blind
//! default comparison, suffix and set matching, presence checks and
//! date/time ordering.

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::counter::FrequencyCounter;
use crate::error::{ConfigResult, ConfigurationError};
use crate::format::{
    default_string_compare, ends_with_ignore_case, format_date_time, format_percent, is_blank,
    is_valid_date_time_pattern, parse_date_time, wrap, DATE_TIME_FORMAT,
};

/// Token in an entry label that is replaced by the expected value.
pub const EXPECTED_VALUE_TOKEN: &str = "#EV";

/// Points awarded by entries registered without an explicit value.
pub const DEFAULT_ENTRY_POINTS: u32 = 1;

/// The reference value an entry is tested against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// No reference value: presence checks and explicit pass/fail only.
    None,
    Text(String),
    /// Candidates tried in order; the first match wins.
    AnyOf(Vec<String>),
    DateTime(NaiveDateTime),
}

impl Expected {
    pub fn kind(&self) -> &'static str {
        match self {
            Expected::None => "none",
            Expected::Text(_) => "text",
            Expected::AnyOf(_) => "a list of strings",
            Expected::DateTime(_) => "a date/time",
        }
    }
}

impl From<&str> for Expected {
    fn from(value: &str) -> Self {
        Expected::Text(value.to_string())
    }
}

impl From<String> for Expected {
    fn from(value: String) -> Self {
        Expected::Text(value)
    }
}

impl From<Vec<String>> for Expected {
    fn from(values: Vec<String>) -> Self {
        Expected::AnyOf(values)
    }
}

impl From<NaiveDateTime> for Expected {
    fn from(value: NaiveDateTime) -> Self {
        Expected::DateTime(value)
    }
}

/// A registered assertion and its statistics.
#[derive(Debug, Clone)]
pub struct Entry {
    pub label: String,
    pub expected: Expected,
    pub points: u32,
    pass_count: u64,
    total_count: u64,
    observed: FrequencyCounter<String>,
}

impl Entry {
    fn new(label: String, expected: Expected, points: u32) -> Self {
        let label = match &expected {
            Expected::Text(text) if label.contains(EXPECTED_VALUE_TOKEN) => {
                label.replace(EXPECTED_VALUE_TOKEN, text)
            }
            _ => label,
        };
        Self {
            label,
            expected,
            points,
            pass_count: 0,
            total_count: 0,
            observed: FrequencyCounter::new(),
        }
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn fail_count(&self) -> u64 {
        self.total_count - self.pass_count
    }

    pub fn observed_values(&self) -> &FrequencyCounter<String> {
        &self.observed
    }
}

/// Registry of [`Entry`] values with a per-submission score and explanation sink.
#[derive(Debug, Clone, Default)]
pub struct AssertionEngine {
    entries: IndexMap<String, Entry>,
    explanations: Vec<String>,
    points: u32,
}

impl AssertionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry worth [`DEFAULT_ENTRY_POINTS`].
    ///
    /// A `#EV` token in `label` is replaced by `expected` when that is text.
    pub fn add_entry(
        &mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        expected: impl Into<Expected>,
    ) {
        self.add_scored_entry(key, label, expected, DEFAULT_ENTRY_POINTS);
    }

    pub fn add_scored_entry(
        &mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        expected: impl Into<Expected>,
        points: u32,
    ) {
        let key = key.into();
        let entry = Entry::new(label.into(), expected.into(), points);
        tracing::debug!(key = %key, expected = entry.expected.kind(), points, "entry registered");
        if self.entries.insert(key.clone(), entry).is_some() {
            tracing::warn!(key = %key, "entry re-registered, previous definition replaced");
        }
    }

    /// Start a new submission: no explanations, zero points.
    pub fn reset(&mut self) {
        self.explanations = Vec::new();
        self.points = 0;
    }

    /// Unconditional failure. `message` (or the entry label) is both explained and counted.
    pub fn fail(&mut self, key: &str, message: Option<&str>) -> ConfigResult<u32> {
        let entry = Self::lookup_mut(&mut self.entries, key)?;
        let message = message.map_or_else(|| entry.label.clone(), str::to_string);
        entry.total_count += 1;
        entry.observed.increment_null_safe(Some(&message));
        self.explanations.push(message);
        Ok(0)
    }

    /// Unconditional success.
    pub fn pass(&mut self, key: &str) -> ConfigResult<u32> {
        self.test(key, None, true)
    }

    /// Record `value` and score the entry according to `predicate`.
    pub fn test(&mut self, key: &str, value: Option<&str>, predicate: bool) -> ConfigResult<u32> {
        let entry = Self::lookup_mut(&mut self.entries, key)?;
        entry.total_count += 1;
        entry.observed.increment_null_safe(value);

        if predicate {
            entry.pass_count += 1;
            self.points = self.points.saturating_add(entry.points);
            Ok(entry.points)
        } else {
            self.explanations
                .push(format!("{}, not {}", entry.label, wrap(value)));
            Ok(0)
        }
    }

    /// Score an entry on a predicate alone, with no value to record.
    pub fn test_predicate(&mut self, key: &str, predicate: bool) -> ConfigResult<u32> {
        self.test(key, None, predicate)
    }

    /// Default comparison against a text expectation: case and punctuation are ignored.
    pub fn test_value(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        let expected = self.expected_text(key)?;
        let predicate = default_string_compare(value, &expected);
        self.test(key, value, predicate)
    }

    /// Pass if `value` matches any candidate under the default comparison.
    pub fn test_set_of_strings(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        let entry = Self::lookup(&self.entries, key)?;
        let Expected::AnyOf(candidates) = &entry.expected else {
            return Err(kind_mismatch(key, "a list of strings", &entry.expected));
        };

        if candidates
            .iter()
            .any(|candidate| default_string_compare(value, candidate))
        {
            return self.test(key, value, true);
        }

        let message = format!("{} , not {}", entry.label, wrap(value));
        self.fail(key, Some(&message))
    }

    /// Pass if `value` ends with the expected text.
    pub fn test_ends_with(
        &mut self,
        key: &str,
        value: Option<&str>,
        case_insensitive: bool,
    ) -> ConfigResult<u32> {
        let suffix = self.expected_text(key)?;
        let predicate = value.is_some_and(|v| {
            if case_insensitive {
                ends_with_ignore_case(v, &suffix)
            } else {
                v.ends_with(&suffix)
            }
        });
        self.test(key, value, predicate)
    }

    /// Pass if `value` is present and not empty.
    pub fn test_if_present(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        self.test(key, value, !is_blank(value))
    }

    /// Pass if `value` is missing or empty.
    pub fn test_if_empty(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        self.test(key, value, is_blank(value))
    }

    /// Pass if `value` equals the expected date/time.
    ///
    /// `format` is a chrono format string; the formatted value is what gets
    /// counted and shown in failure messages.
    pub fn test_dt_equals(
        &mut self,
        key: &str,
        value: Option<NaiveDateTime>,
        format: &str,
    ) -> ConfigResult<u32> {
        self.test_date_time(key, value, format, |v, expected| v == expected)
    }

    /// Pass if `value` is on or after the expected date/time.
    pub fn test_on_or_after(
        &mut self,
        key: &str,
        value: Option<NaiveDateTime>,
        format: &str,
    ) -> ConfigResult<u32> {
        self.test_date_time(key, value, format, |v, expected| v >= expected)
    }

    /// Pass if `value` is on or before the expected date/time.
    pub fn test_on_or_before(
        &mut self,
        key: &str,
        value: Option<NaiveDateTime>,
        format: &str,
    ) -> ConfigResult<u32> {
        self.test_date_time(key, value, format, |v, expected| v <= expected)
    }

    fn test_date_time(
        &mut self,
        key: &str,
        value: Option<NaiveDateTime>,
        format: &str,
        compare: impl Fn(NaiveDateTime, NaiveDateTime) -> bool,
    ) -> ConfigResult<u32> {
        let entry = Self::lookup(&self.entries, key)?;
        let Expected::DateTime(expected) = entry.expected else {
            return Err(kind_mismatch(key, "a date/time", &entry.expected));
        };
        if !is_valid_date_time_pattern(format) {
            return Err(invalid_pattern(key, format));
        }
        let formatted = value
            .map(|v| format_date_time(v, format).ok_or_else(|| invalid_pattern(key, format)))
            .transpose()?;
        let predicate = value.is_some_and(|v| compare(v, expected));
        self.test(key, formatted.as_deref(), predicate)
    }

    /// The check an entry gets when graded against a submission field.
    ///
    /// Text uses the default comparison, a candidate list is tried in order,
    /// a date/time must parse as `yyyy-MM-dd HH:mm` and be equal, and an
    /// entry without an expectation passes when the value is present.
    pub fn test_default(&mut self, key: &str, value: Option<&str>) -> ConfigResult<u32> {
        let expected = self.entry(key)?.expected.clone();
        match expected {
            Expected::None => self.test_if_present(key, value),
            Expected::Text(_) => self.test_value(key, value),
            Expected::AnyOf(_) => self.test_set_of_strings(key, value),
            Expected::DateTime(_) => match value.and_then(parse_date_time) {
                Some(parsed) => self.test_dt_equals(key, Some(parsed), DATE_TIME_FORMAT),
                None => self.test(key, value, false),
            },
        }
    }

    pub fn explanations(&self) -> &[String] {
        &self.explanations
    }

    pub fn take_explanations(&mut self) -> Vec<String> {
        std::mem::take(&mut self.explanations)
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// Points a submission passing every entry would earn.
    pub fn max_points(&self) -> u32 {
        self.entries
            .values()
            .fold(0, |total, entry| total.saturating_add(entry.points))
    }

    pub fn entry(&self, key: &str) -> ConfigResult<&Entry> {
        Self::lookup(&self.entries, key)
    }

    pub fn counter(&self, key: &str) -> ConfigResult<&FrequencyCounter<String>> {
        Ok(&self.entry(key)?.observed)
    }

    /// True once the entry has failed at least once.
    pub fn has_content(&self, key: &str) -> ConfigResult<bool> {
        let entry = self.entry(key)?;
        Ok(entry.total_count != entry.pass_count)
    }

    /// `"label, correct: N(P%), incorrect: M(Q%)"`.
    pub fn format(&self, key: &str) -> ConfigResult<String> {
        let entry = self.entry(key)?;
        let failed = entry.fail_count();
        Ok(format!(
            "{}, correct: {}({}), incorrect: {}({})",
            entry.label,
            entry.pass_count,
            format_percent(entry.pass_count, entry.total_count),
            failed,
            format_percent(failed, entry.total_count),
        ))
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expected_text(&self, key: &str) -> ConfigResult<String> {
        match &self.entry(key)?.expected {
            Expected::Text(text) => Ok(text.clone()),
            other => Err(kind_mismatch(key, "text", other)),
        }
    }

    fn lookup<'a>(entries: &'a IndexMap<String, Entry>, key: &str) -> ConfigResult<&'a Entry> {
        entries
            .get(key)
            .ok_or_else(|| ConfigurationError::UnregisteredKey(key.to_string()))
    }

    fn lookup_mut<'a>(
        entries: &'a mut IndexMap<String, Entry>,
        key: &str,
    ) -> ConfigResult<&'a mut Entry> {
        entries
            .get_mut(key)
            .ok_or_else(|| ConfigurationError::UnregisteredKey(key.to_string()))
    }
}

fn invalid_pattern(key: &str, pattern: &str) -> ConfigurationError {
    ConfigurationError::InvalidDefinition {
        key: key.to_string(),
        message: format!("'{pattern}' is not a usable date/time format"),
    }
}

fn kind_mismatch(key: &str, expected: &'static str, actual: &Expected) -> ConfigurationError {
    ConfigurationError::ExpectedKindMismatch {
        key: key.to_string(),
        expected,
        actual: actual.kind(),
    }
}
