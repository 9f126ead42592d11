//! Error types for optmodel.

use std::fmt;

use thiserror::Error;

/// Which handle family an index error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A variable handle.
    Variable,
    /// A constraint handle (any function/set pair).
    Constraint,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Variable => write!(f, "variable"),
            HandleKind::Constraint => write!(f, "constraint"),
        }
    }
}

/// Main error type for registry operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A constraint was added with a function/set pair the registry was
    /// not configured to store.
    #[error("unsupported constraint kind: {function}-in-{set}")]
    UnsupportedConstraintKind {
        /// Kind name of the offending function type.
        function: &'static str,
        /// Kind name of the offending set type.
        set: &'static str,
    },

    /// A handle that is out of range, deleted, or was never issued.
    #[error("invalid {kind} handle: {value}")]
    InvalidIndex {
        /// Whether the handle names a variable or a constraint.
        kind: HandleKind,
        /// The raw handle value.
        value: u64,
    },

    /// Two or more live entries share the looked-up name.
    #[error("name `{0}` is shared by multiple live entries")]
    AmbiguousName(String),

    /// A modification delta was applied to a function kind that cannot
    /// absorb it.
    #[error("unsupported modification: {0}")]
    UnsupportedModification(&'static str),

    /// Internal error (should not occur in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_index_display() {
        let err = ModelError::InvalidIndex {
            kind: HandleKind::Variable,
            value: 7,
        };
        assert_eq!(err.to_string(), "invalid variable handle: 7");
    }

    #[test]
    fn test_unsupported_kind_display() {
        let err = ModelError::UnsupportedConstraintKind {
            function: "ScalarAffine",
            set: "LessThan",
        };
        assert_eq!(
            err.to_string(),
            "unsupported constraint kind: ScalarAffine-in-LessThan"
        );
    }
}
