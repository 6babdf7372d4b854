//! Editing state machine.
//!
//! Owns the live input buffer and applies button presses to it. The buffer
//! keeps binary operators as ` op ` tokens and parentheses as `( ` / ` )`, so
//! backspace can remove whole tokens. A `-` typed right after an operator is
//! kept as a unary sign (`3 × -4`).

use serde::Serialize;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use super::base::{Base, Mode};
use super::convert::convert;
use super::evaluation::Evaluator;
use super::format::{FormatOptions, format_editable, format_value};
use super::memory::MemoryRegister;
use super::number::NumericValue;
use super::parens::ParenthesesTracker;
use crate::config::Settings;
use crate::error::{CalcError, Result};

const IDLE: &str = "0";
const OPEN_PAREN: &str = "( ";
const CLOSE_PAREN: &str = " )";

/// Binary operators available on the keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    ShiftLeft,
    ShiftRight,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Modulo,
        Operator::ShiftLeft,
        Operator::ShiftRight,
    ];

    /// Symbol shown in the buffer.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "×",
            Self::Divide => "÷",
            Self::Modulo => "%",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }

    fn token(self) -> String {
        format!(" {} ", self.glyph())
    }

    fn is_shift(self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }
}

/// A key label that names no button.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key '{0}'")]
pub struct UnknownKey(pub String);

/// A button press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// `0-9`, or `A-F` in hexadecimal.
    Digit(char),
    Decimal,
    Operator(Operator),
    OpenParen,
    CloseParen,
    Backspace,
    /// `AC` / `C`
    Clear,
    /// `CE`
    ClearEntry,
    Equals,
    Percent,
    PlusMinus,
    MemoryClear,
    MemoryRecall,
    MemoryStore,
    MemoryAdd,
    MemorySubtract,
}

impl FromStr for Key {
    type Err = UnknownKey;

    /// Parse a key label. `C` is clear; type hex `C` in lowercase.
    fn from_str(s: &str) -> std::result::Result<Self, UnknownKey> {
        let key = match s {
            "." => Key::Decimal,
            "+" => Key::Operator(Operator::Add),
            "-" | "−" => Key::Operator(Operator::Subtract),
            "*" | "×" | "x" => Key::Operator(Operator::Multiply),
            "/" | "÷" => Key::Operator(Operator::Divide),
            "mod" => Key::Operator(Operator::Modulo),
            "<<" => Key::Operator(Operator::ShiftLeft),
            ">>" => Key::Operator(Operator::ShiftRight),
            "(" => Key::OpenParen,
            ")" => Key::CloseParen,
            "BS" | "⌫" | "backspace" => Key::Backspace,
            "AC" | "C" => Key::Clear,
            "CE" => Key::ClearEntry,
            "=" | "enter" => Key::Equals,
            "%" => Key::Percent,
            "±" | "+/-" | "neg" => Key::PlusMinus,
            "MC" => Key::MemoryClear,
            "MR" => Key::MemoryRecall,
            "MS" => Key::MemoryStore,
            "M+" => Key::MemoryAdd,
            "M-" => Key::MemorySubtract,
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_hexdigit() => Key::Digit(c.to_ascii_uppercase()),
                    _ => return Err(UnknownKey(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

/// The canonical editing state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditingState {
    pub input: String,
    pub error: Option<CalcError>,
    pub active_base: Base,
}

/// Read-only view of where the machine is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState<'a> {
    Idle,
    Entering(&'a str),
    Error(&'a CalcError),
}

/// The buffer and its value as seen from one base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayValue {
    pub base: Base,
    pub input: String,
    pub display: String,
}

#[derive(Clone, Debug)]
struct Notice {
    error: CalcError,
    expires_at: Instant,
}

fn trailing_operator(input: &str) -> Option<Operator> {
    Operator::ALL
        .into_iter()
        .find(|op| input.ends_with(&op.token()))
}

fn ends_with_unary_minus(input: &str) -> bool {
    input == "-" || input.ends_with(" -")
}

/// Text after the last space: a number, a sign, `)` or nothing.
fn trailing_operand(input: &str) -> &str {
    match input.rfind(' ') {
        Some(i) => &input[i + 1..],
        None => input,
    }
}

fn is_number_operand(operand: &str) -> bool {
    !operand.is_empty() && operand != "-" && operand != ")"
}

fn replace_operand(input: &str, operand: &str, replacement: &str) -> String {
    format!("{}{}", &input[..input.len() - operand.len()], replacement)
}

/// Calculator editor: input buffer, parentheses bookkeeping and memory.
#[derive(Debug)]
pub struct Editor {
    state: EditingState,
    settings: Settings,
    parens: ParenthesesTracker,
    memory: MemoryRegister,
    /// Exact value of the last `=`, while the buffer shows it.
    result: Option<NumericValue>,
    notice: Option<Notice>,
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: EditingState {
                input: IDLE.to_string(),
                error: None,
                active_base: settings.active_base(),
            },
            settings,
            parens: ParenthesesTracker::new(),
            memory: MemoryRegister::new(),
            result: None,
            notice: None,
        }
    }

    pub fn editing_state(&self) -> &EditingState {
        &self.state
    }

    pub fn state(&self) -> EditorState<'_> {
        match &self.state.error {
            Some(err) => EditorState::Error(err),
            None if self.state.input == IDLE => EditorState::Idle,
            None => EditorState::Entering(&self.state.input),
        }
    }

    pub fn input(&self) -> &str {
        &self.state.input
    }

    /// Text to show: the buffer, or the error message.
    pub fn display(&self) -> String {
        match &self.state.error {
            Some(err) => err.to_string(),
            None => self.state.input.clone(),
        }
    }

    /// Transient notice (length limit), until it expires.
    pub fn notice(&self) -> Option<&CalcError> {
        self.notice
            .as_ref()
            .filter(|n| Instant::now() < n.expires_at)
            .map(|n| &n.error)
    }

    pub fn parens(&self) -> &ParenthesesTracker {
        &self.parens
    }

    pub fn memory(&self) -> &MemoryRegister {
        &self.memory
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Exact value of the last successful `=`, if it is still displayed.
    pub fn result(&self) -> Option<&NumericValue> {
        self.result.as_ref()
    }

    fn format_options(&self) -> FormatOptions {
        self.settings.format_options()
    }

    pub fn press(&mut self, key: Key, evaluator: &Evaluator) {
        match key {
            Key::Digit(c) => self.digit(c),
            Key::Decimal => self.decimal(),
            Key::Operator(op) => self.operator(op),
            Key::OpenParen => self.open_paren(),
            Key::CloseParen => self.close_paren(),
            Key::Backspace => self.backspace(),
            Key::Clear => self.clear(),
            Key::ClearEntry => self.clear_entry(),
            Key::Equals => self.equals(evaluator),
            Key::Percent => self.transform(true),
            Key::PlusMinus => self.transform(false),
            Key::MemoryClear => self.memory.clear(),
            Key::MemoryRecall => self.memory_recall(),
            Key::MemoryStore => {
                if let Some(v) = self.current_value(evaluator) {
                    self.memory.store_value(v);
                }
            }
            Key::MemoryAdd => {
                if let Some(v) = self.current_value(evaluator) {
                    self.memory.add_value(v);
                }
            }
            Key::MemorySubtract => {
                if let Some(v) = self.current_value(evaluator) {
                    self.memory.subtract_value(v);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state.input = IDLE.to_string();
        self.state.error = None;
        self.parens.reset();
        self.result = None;
        self.notice = None;
    }

    /// Swap a displayed result for its editable form so typing can continue.
    fn continue_from_result(&mut self) {
        if let Some(v) = self.result.take() {
            self.state.input = format_editable(&v, &self.format_options());
        }
    }

    /// Accept `candidate` as the new buffer unless it is too long.
    fn commit(&mut self, candidate: String) -> bool {
        let limit = self.settings.max_length_for(self.settings.mode);
        if candidate.chars().count() > limit {
            debug!(limit, "input length limit reached");
            self.notice = Some(Notice {
                error: CalcError::LengthLimitExceeded(limit),
                expires_at: Instant::now() + Duration::from_millis(self.settings.notice_timeout_ms),
            });
            return false;
        }
        self.state.input = candidate;
        self.notice = None;
        true
    }

    fn digit(&mut self, c: char) {
        let c = c.to_ascii_uppercase();
        if self.state.error.is_some() || self.result.is_some() {
            self.reset();
        }
        if !self.state.active_base.is_digit(c) {
            debug!(digit = %c, base = %self.state.active_base, "digit not valid in base");
            return;
        }

        let input = &self.state.input;
        if input.ends_with(CLOSE_PAREN) {
            return;
        }
        let candidate = match trailing_operand(input) {
            // no leading zeros
            "0" | "-0" => format!("{}{c}", &input[..input.len() - 1]),
            _ => format!("{input}{c}"),
        };
        self.commit(candidate);
    }

    fn decimal(&mut self) {
        if self.state.error.is_some() || self.result.is_some() {
            self.reset();
        }
        if self.settings.mode.is_programmer() {
            return;
        }

        let input = &self.state.input;
        let operand = trailing_operand(input);
        if input.ends_with(CLOSE_PAREN) || operand.contains('.') {
            return;
        }
        let candidate = if operand.is_empty() || operand == "-" {
            format!("{input}0.")
        } else {
            format!("{input}.")
        };
        self.commit(candidate);
    }

    fn operator(&mut self, op: Operator) {
        if op.is_shift() && !self.settings.mode.is_programmer() {
            debug!(operator = op.glyph(), "shift outside programmer mode");
            return;
        }
        if self.state.error.is_some() {
            self.reset();
        }
        self.continue_from_result();

        let mut input = self.state.input.clone();
        if ends_with_unary_minus(&input) {
            if op == Operator::Subtract {
                return;
            }
            input.pop();
        }

        if input.ends_with(OPEN_PAREN) {
            // only a sign may open a group
            if op == Operator::Subtract {
                input.push('-');
                self.commit(input);
            }
            return;
        }

        match trailing_operator(&input) {
            Some(_) if op == Operator::Subtract => input.push('-'),
            Some(previous) => {
                input.truncate(input.len() - previous.token().len());
                input.push_str(&op.token());
            }
            None => input.push_str(&op.token()),
        }
        self.commit(input);
    }

    fn open_paren(&mut self) {
        if self.state.error.is_some() || self.result.is_some() {
            self.reset();
        }

        let mut input = self.state.input.clone();
        if input == IDLE {
            input.clear();
        } else if input.ends_with(CLOSE_PAREN) || is_number_operand(trailing_operand(&input)) {
            input.push_str(&Operator::Multiply.token());
        }
        let start = input.len();
        input.push_str(OPEN_PAREN);
        if self.commit(input) {
            self.parens.open(start);
        }
    }

    fn close_paren(&mut self) {
        if self.state.error.is_some() || self.result.is_some() || self.parens.count() == 0 {
            return;
        }

        let mut input = self.state.input.clone();
        if !input.ends_with(CLOSE_PAREN) && !is_number_operand(trailing_operand(&input)) {
            return;
        }
        let end = input.len() + CLOSE_PAREN.len() - 1;
        input.push_str(CLOSE_PAREN);
        if self.commit(input) {
            self.parens.close(end);
        }
    }

    fn backspace(&mut self) {
        if self.state.error.is_some() {
            self.reset();
            return;
        }
        self.continue_from_result();

        let mut input = std::mem::take(&mut self.state.input);
        if input.ends_with(CLOSE_PAREN) {
            input.truncate(input.len() - CLOSE_PAREN.len());
            self.parens.reopen_last();
        } else if input.ends_with(OPEN_PAREN) {
            input.truncate(input.len() - OPEN_PAREN.len());
            self.parens.discard_last_open();
        } else if let Some(op) = trailing_operator(&input) {
            input.truncate(input.len() - op.token().len());
        } else {
            input.pop();
        }

        if input.is_empty() || input == "-" {
            input = IDLE.to_string();
        }
        self.state.input = input;
        self.notice = None;
    }

    pub fn clear(&mut self) {
        self.reset();
    }

    fn clear_entry(&mut self) {
        if self.state.error.is_some() || self.result.is_some() || self.state.input == IDLE {
            self.reset();
            return;
        }

        let operand = trailing_operand(&self.state.input);
        if !is_number_operand(operand) && operand != "-" {
            return;
        }
        let mut input = replace_operand(&self.state.input, operand, "");
        if input.is_empty() {
            input = IDLE.to_string();
        }
        self.state.input = input;
        self.notice = None;
    }

    fn equals(&mut self, evaluator: &Evaluator) {
        if self.state.error.is_some() || self.result.is_some() {
            return;
        }

        match evaluator.evaluate(&self.state.input, &self.settings.eval_options()) {
            Ok(value) => {
                self.state.input = format_value(&value, &self.format_options());
                self.result = Some(value);
                self.parens.reset();
            }
            Err(err) => {
                debug!(input = %self.state.input, error = %err, "equals failed");
                self.state.error = Some(err);
            }
        }
    }

    fn parse_operand(&self, operand: &str) -> Result<NumericValue> {
        let base = self.state.active_base;
        let parsed = if base.is_decimal() {
            operand.parse().ok()
        } else {
            NumericValue::parse_radix(operand, base)
        };
        parsed.ok_or_else(|| CalcError::invalid_operation(format!("'{operand}' is not a number")))
    }

    /// Percent (`/ 100`) or sign change of one operand.
    fn apply_transform(&self, value: &NumericValue, percent: bool) -> Result<NumericValue> {
        let transformed = if percent { value.percent() } else { -value.clone() };
        if self.settings.mode.is_programmer() && !transformed.is_integer() {
            return Err(CalcError::invalid_operation("result is not an integer"));
        }
        if transformed.exceeds_i64() {
            return Err(CalcError::invalid_operation("result out of range"));
        }
        Ok(transformed)
    }

    fn transform(&mut self, percent: bool) {
        if self.state.error.is_some() {
            return;
        }
        let options = self.format_options();

        if let Some(value) = self.result.clone() {
            match self.apply_transform(&value, percent) {
                Ok(v) => {
                    self.state.input = format_value(&v, &options);
                    self.result = Some(v);
                }
                Err(err) => self.state.error = Some(err),
            }
            return;
        }

        let input = self.state.input.clone();
        let operand = trailing_operand(&input);
        if !is_number_operand(operand) {
            self.state.error = Some(CalcError::invalid_operation("no operand"));
            return;
        }
        let transformed = self
            .parse_operand(operand)
            .and_then(|v| self.apply_transform(&v, percent));
        match transformed {
            Ok(v) => {
                let rendered = format_editable(&v, &options);
                self.commit(replace_operand(&input, operand, &rendered));
            }
            Err(err) => self.state.error = Some(err),
        }
    }

    /// Value of the buffer for the memory keys; `None` if it does not evaluate.
    fn current_value(&self, evaluator: &Evaluator) -> Option<NumericValue> {
        if let Some(v) = &self.result {
            return Some(v.clone());
        }
        if self.state.error.is_some() {
            return None;
        }
        evaluator
            .evaluate(&self.state.input, &self.settings.eval_options())
            .map_err(|err| debug!(error = %err, "memory key ignored"))
            .ok()
    }

    fn memory_recall(&mut self) {
        if self.state.error.is_some() || self.result.is_some() {
            self.reset();
        }
        let input = self.state.input.clone();
        if input.ends_with(CLOSE_PAREN) {
            return;
        }

        let operand = trailing_operand(&input);
        let value = self.memory.recall();
        // a typed sign applies to the recalled value
        let value = if operand.starts_with('-') { -value } else { value };
        let rendered = format_editable(&value, &self.format_options());
        self.commit(replace_operand(&input, operand, &rendered));
    }

    /// Switch the programmer-mode base, converting the buffer.
    pub fn set_base(&mut self, base: Base) {
        if !self.settings.mode.is_programmer() {
            debug!(%base, "base change outside programmer mode");
            return;
        }
        let from = self.state.active_base;
        if from == base {
            return;
        }
        if self.state.error.is_some() {
            self.reset();
        }

        self.settings.base = base;
        self.state.active_base = base;
        if let Some(v) = &self.result {
            self.state.input = format_value(v, &self.settings.format_options());
            return;
        }
        match convert(&self.state.input, from, base) {
            Ok(converted) => {
                self.state.input = converted;
                self.rebuild_parens();
            }
            Err(err) => {
                warn!(error = %err, "buffer could not be converted, clearing");
                self.reset();
            }
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
        self.state.active_base = self.settings.active_base();
        self.reset();
    }

    /// Replace the settings. Cached evaluations are dropped since they may
    /// depend on the old options.
    pub fn apply_settings(&mut self, settings: Settings, evaluator: &Evaluator) {
        evaluator.clear_cache();
        let layout_changed =
            settings.mode != self.settings.mode || settings.active_base() != self.state.active_base;
        self.settings = settings;
        self.state.active_base = self.settings.active_base();
        if layout_changed {
            self.reset();
        } else if let Some(v) = &self.result {
            self.state.input = format_value(v, &self.settings.format_options());
        }
    }

    /// Offsets change after a base conversion; rescan the buffer.
    fn rebuild_parens(&mut self) {
        self.parens.reset();
        for (i, c) in self.state.input.char_indices() {
            match c {
                '(' => self.parens.open(i),
                ')' => {
                    self.parens.close(i);
                }
                _ => {}
            }
        }
    }

    /// The buffer and its value in every base.
    pub fn display_values(&self, evaluator: &Evaluator) -> Vec<DisplayValue> {
        let value = self.current_value(evaluator);
        let active = self.state.active_base;

        Base::ALL
            .into_iter()
            .map(|base| {
                let input = match &self.result {
                    Some(v) => v.to_radix_string(base),
                    None => convert(&self.state.input, active, base)
                        .unwrap_or_else(|_| IDLE.to_string()),
                };
                let options = FormatOptions {
                    base,
                    mode: Mode::Programmer,
                    ..self.format_options()
                };
                let display = value
                    .as_ref()
                    .map(|v| format_value(v, &options))
                    .unwrap_or_default();
                DisplayValue { base, input, display }
            })
            .collect()
    }
}
