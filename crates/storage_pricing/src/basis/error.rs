//! Basis expression errors.

use thiserror::Error;

/// Errors raised while parsing a basis-function expression.
///
/// Positions are byte offsets into the expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BasisError {
    /// A variable name that is not a model factor, `s` or `t`.
    #[error("unknown basis variable '{name}' at position {position}; expected one of: {expected}")]
    UnknownBasisVariable {
        /// The name as written.
        name: String,
        /// Offset of the name.
        position: usize,
        /// Comma-separated list of valid names.
        expected: String,
    },

    /// Malformed expression text.
    #[error("basis parse error at position {position}: {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// Offset of the offending token.
        position: usize,
    },

    /// The expression contains no terms.
    #[error("basis expression is empty")]
    Empty,
}
