//! fieldgrade-core: rule evaluation, assertions, and frequency statistics.
//!
//! This crate grades already-parsed exercise submissions field by field.
//! It defines the frequency counter both engines record observed values
//! into, the typed [`rules::RuleEvaluator`], the data-driven
//! [`assertions::AssertionEngine`], and the exercise definition files and
//! reports built around them.

pub mod assertions;
pub mod counter;
pub mod definition;
pub mod error;
pub mod format;
pub mod grading;
pub mod report;
pub mod rules;
pub mod statistics;

pub use assertions::{AssertionEngine, Entry, Expected};
pub use counter::FrequencyCounter;
pub use error::{ConfigResult, ConfigurationError};
pub use rules::{Rule, RuleEvaluator, RuleType};
