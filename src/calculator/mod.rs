//! Calculator engine.
//!
//! This module provides functionality to:
//! - Sanitize raw input and convert literals between bases
//! - Evaluate expressions exactly, with a bounded memoizing cache
//! - Format results for standard and programmer modes
//! - Drive the keypad editing state machine

mod base;
mod cache;
mod convert;
mod editor;
mod evaluation;
mod format;
mod memory;
mod number;
mod outcome;
mod parens;
mod sanitize;

pub use base::{Base, BaseSpec, Mode};
pub use cache::{DEFAULT_CAPACITY, EvaluationCache};
pub use convert::{OVERFLOW, convert, convert_between_bases};
pub use editor::{DisplayValue, EditingState, Editor, EditorState, Key, Operator, UnknownKey};
pub use evaluation::{EvalOptions, Evaluator, evaluate_decimal};
pub use format::{FormatOptions, format_editable, format_value};
pub use memory::MemoryRegister;
pub use number::NumericValue;
pub use outcome::{Outcome, calculate};
pub use parens::{Group, ParenthesesTracker};
pub use sanitize::sanitize;
