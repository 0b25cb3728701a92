#![forbid(unsafe_code)]

//! Configuration error types.

use thiserror::Error;

/// A controller configuration that cannot be run.
///
/// Every variant names the offending field with a dotted path such as
/// `progress.increment`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A list or count that must be non-empty is empty.
    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    /// A duration that paces a transition is zero.
    #[error("'{field}' must be a non-zero duration")]
    ZeroDuration { field: &'static str },

    /// A value that must be strictly positive (or non-negative) is not.
    #[error("'{field}' has invalid value {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// The upper end of a range is below the lower end.
    #[error("'{field}' range is inverted: {lo} > {hi}")]
    InvertedRange {
        field: &'static str,
        lo: f64,
        hi: f64,
    },

    /// A probability outside `[0, 1]`.
    #[error("'{field}' must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },

    /// An initial value outside its own bounds.
    #[error("'{field}' value {value} lies outside its bounds")]
    OutOfBounds { field: &'static str, value: f64 },

    /// A list whose length is tied to another setting.
    #[error("'{field}' needs {expected} entries, got {found}")]
    CountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::InvertedRange {
            field: "progress.increment",
            lo: 2.5,
            hi: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "'progress.increment' range is inverted: 2.5 > 0.5"
        );
        let err = ConfigError::Empty {
            field: "typing.sources",
        };
        assert_eq!(err.to_string(), "'typing.sources' must not be empty");
    }
}
