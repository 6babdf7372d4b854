//! Calculator engine: expression evaluation, base conversion, result
//! formatting and a keypad editing state machine.

pub mod calculator;
pub mod config;
pub mod error;

pub use calculator::{Editor, Evaluator, Outcome, calculate};
pub use config::Settings;
pub use error::{CalcError, ErrorKind, Result};
