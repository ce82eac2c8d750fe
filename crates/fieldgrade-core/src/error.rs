//! Configuration error types.
//!
//! These errors mean an exercise was configured wrongly (an unknown key,
//! a rule whose placeholder does not fit its type, ...). They abort the
//! grading run. A submitted value failing its rule is *not* an error: it
//! is recorded as an explanation string and scores zero.

use thiserror::Error;

/// Errors raised when rules or entries are registered or referenced incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An operation referenced a key that was never registered.
    #[error("no rule or entry registered for key: {0}")]
    UnregisteredKey(String),

    /// The rule type compares against a placeholder, but none was supplied.
    #[error("rule {key}: type {rule_type} requires a placeholder")]
    MissingPlaceholder { key: String, rule_type: String },

    /// The rule type takes no placeholder, but one was supplied.
    #[error("rule {key}: type {rule_type} must not have a placeholder")]
    UnexpectedPlaceholder { key: String, rule_type: String },

    /// The rule type name is unknown or has no evaluation semantics.
    #[error("unsupported rule type: {0}")]
    UnsupportedRuleType(String),

    /// A specialized test was applied to an entry holding the wrong kind of expected value.
    #[error("entry {key}: expected value is {actual}, but the test needs {expected}")]
    ExpectedKindMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A definition could not be turned into a rule or entry.
    #[error("invalid definition for {key}: {message}")]
    InvalidDefinition { key: String, message: String },
}

impl ConfigurationError {
    /// The key the error refers to, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigurationError::UnregisteredKey(key)
            | ConfigurationError::MissingPlaceholder { key, .. }
            | ConfigurationError::UnexpectedPlaceholder { key, .. }
            | ConfigurationError::ExpectedKindMismatch { key, .. }
            | ConfigurationError::InvalidDefinition { key, .. } => Some(key),
            ConfigurationError::UnsupportedRuleType(_) => None,
        }
    }
}

/// Result alias for engine operations that can only fail on misconfiguration.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ConfigurationError::UnregisteredKey("callsign".into());
        assert_eq!(
            err.to_string(),
            "no rule or entry registered for key: callsign"
        );

        let err = ConfigurationError::MissingPlaceholder {
            key: "date".into(),
            rule_type: "DATE_TIME_NOT".into(),
        };
        assert!(err.to_string().contains("requires a placeholder"));
    }

    #[test]
    fn key_accessor() {
        assert_eq!(
            ConfigurationError::UnregisteredKey("x".into()).key(),
            Some("x")
        );
        assert_eq!(
            ConfigurationError::UnsupportedRuleType("LIST".into()).key(),
            None
        );
    }
}
