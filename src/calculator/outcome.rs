//! One-shot calculation result.

use serde::Serialize;

use super::evaluation::Evaluator;
use super::format::{format_editable, format_value};
use crate::config::Settings;
use crate::error::ErrorKind;

/// The result of evaluating one expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success {
        /// The original expression.
        expression: String,
        /// Formatted for display (fractions, grouping, base).
        display: String,
        /// Plain form without grouping, suitable for copying or re-entry.
        plain: String,
    },
    Failure {
        expression: String,
        kind: ErrorKind,
        message: String,
    },
}

impl Outcome {
    pub fn expression(&self) -> &str {
        match self {
            Self::Success { expression, .. } => expression,
            Self::Failure { expression, .. } => expression,
        }
    }

    /// Check if this is a successful result.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Get the display string (result or error message).
    pub fn display(&self) -> &str {
        match self {
            Self::Success { display, .. } => display,
            Self::Failure { message, .. } => message,
        }
    }

    /// Text to copy: the plain result, or the error message.
    pub fn plain(&self) -> &str {
        match self {
            Self::Success { plain, .. } => plain,
            Self::Failure { message, .. } => message,
        }
    }
}

/// Evaluate and format `expression` under `settings`.
pub fn calculate(expression: &str, settings: &Settings, evaluator: &Evaluator) -> Outcome {
    let expression = expression.trim().to_string();
    match evaluator.evaluate(&expression, &settings.eval_options()) {
        Ok(value) => {
            let options = settings.format_options();
            Outcome::Success {
                display: format_value(&value, &options),
                plain: format_editable(&value, &options),
                expression,
            }
        }
        Err(err) => {
            let failure = err.failure();
            Outcome::Failure {
                expression,
                kind: failure.kind,
                message: failure.message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{Base, Mode};

    #[test]
    fn test_success() {
        let settings = Settings {
            use_thousands_separator: true,
            ..Default::default()
        };
        let outcome = calculate(" 1000 × 1000 ", &settings, &Evaluator::new());
        assert!(outcome.is_success());
        assert_eq!(outcome.expression(), "1000 × 1000");
        assert_eq!(outcome.display(), "1,000,000");
        assert_eq!(outcome.plain(), "1000000");
    }

    #[test]
    fn test_failure() {
        let outcome = calculate("5 ÷ 0", &Settings::default(), &Evaluator::new());
        assert!(!outcome.is_success());
        assert_eq!(outcome.display(), "Cannot divide by zero");
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: ErrorKind::DivisionByZero,
                ..
            }
        ));
    }

    #[test]
    fn test_programmer_settings() {
        let settings = Settings {
            mode: Mode::Programmer,
            base: Base::Hex,
            use_thousands_separator: true,
            ..Default::default()
        };
        let outcome = calculate("FF × 101", &settings, &Evaluator::new());
        assert_eq!(outcome.display(), "FF FF");
        assert_eq!(outcome.plain(), "FFFF");
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = calculate("1 / 0", &Settings::default(), &Evaluator::new());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "DivisionByZero");
        assert_eq!(json["expression"], "1 / 0");
    }
}
