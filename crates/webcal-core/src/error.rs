//! Core error types.

use thiserror::Error;

use crate::time::Granularity;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while resolving rules or evaluating queries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The repetition rule text could not be parsed or validated.
    #[error("invalid repetition rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    /// A query boundary cannot be compared against an event start.
    #[error("cannot compare a {boundary} boundary with the {start} start of event `{uid}`")]
    Comparison {
        uid: String,
        start: Granularity,
        boundary: Granularity,
    },

    /// A textual date or date-time could not be parsed.
    #[error("invalid time `{input}`: {reason}")]
    InvalidTime { input: String, reason: String },
}

impl CoreError {
    /// Creates an invalid rule error.
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Creates a comparison error.
    pub fn comparison(uid: impl Into<String>, start: Granularity, boundary: Granularity) -> Self {
        Self::Comparison {
            uid: uid.into(),
            start,
            boundary,
        }
    }

    /// Creates an invalid time error.
    pub fn invalid_time(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTime {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_display_names_both_sides() {
        let err = CoreError::comparison("evt-1", Granularity::Date, Granularity::Zoned);
        let msg = err.to_string();
        assert!(msg.contains("zoned date-time boundary"));
        assert!(msg.contains("date start"));
        assert!(msg.contains("evt-1"));
    }

    #[test]
    fn invalid_rule_display() {
        let err = CoreError::invalid_rule("FREQ=SOMETIMES", "unknown frequency");
        assert_eq!(
            err.to_string(),
            "invalid repetition rule `FREQ=SOMETIMES`: unknown frequency"
        );
    }
}
