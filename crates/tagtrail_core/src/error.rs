//! Error types for tagtrail core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while validating input for the reconcilers and account
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Display name is shorter than the allowed minimum.
    #[error("display name too short: {len} characters, minimum is {min}")]
    DisplayNameTooShort {
        /// Length of the rejected name, in characters.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Display name is longer than the allowed maximum.
    #[error("display name too long: {len} characters, maximum is {max}")]
    DisplayNameTooLong {
        /// Length of the rejected name, in characters.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// A required field was empty.
    #[error("field must not be empty: {field}")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
    },
}

impl CoreError {
    /// Creates an empty-field error.
    pub fn empty(field: &'static str) -> Self {
        CoreError::EmptyField { field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::DisplayNameTooShort { len: 2, min: 3 };
        let msg = err.to_string();
        assert!(msg.contains("too short"));
        assert!(msg.contains('3'));

        assert_eq!(
            CoreError::empty("site").to_string(),
            "field must not be empty: site"
        );
    }
}
