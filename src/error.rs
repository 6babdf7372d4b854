//! Error types for the calculator engine.
//!
//! Every failure in the engine is recoverable: the editor turns any of these
//! into its error display state and a `clear` returns it to idle.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, CalcError>;

/// Errors raised by the evaluator, formatter, converter and editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Division or modulo by zero.
    #[error("Cannot divide by zero")]
    DivisionByZero,
    /// Result outside the signed 64-bit range (or the configured bounds).
    #[error("Overflow")]
    Overflow,
    /// The expression cannot be parsed.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
    /// A syntactically fine operation that has no valid result.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// Soft, transient: the input buffer is full.
    #[error("Maximum length of {0} characters reached")]
    LengthLimitExceeded(usize),
}

/// Plain classification of a [`CalcError`], for hosts that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    DivisionByZero,
    Overflow,
    InvalidExpression,
    InvalidOperation,
    LengthLimitExceeded,
}

/// Structured failure handed across the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl CalcError {
    pub(crate) fn invalid_expression(detail: impl Into<String>) -> Self {
        Self::InvalidExpression(detail.into())
    }

    pub(crate) fn invalid_operation(detail: impl Into<String>) -> Self {
        Self::InvalidOperation(detail.into())
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DivisionByZero => ErrorKind::DivisionByZero,
            Self::Overflow => ErrorKind::Overflow,
            Self::InvalidExpression(_) => ErrorKind::InvalidExpression,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::LengthLimitExceeded(_) => ErrorKind::LengthLimitExceeded,
        }
    }

    /// Check if this error is the soft length-limit notice.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LengthLimitExceeded(_))
    }

    /// Project into the `{kind, message}` shape.
    pub fn failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}
