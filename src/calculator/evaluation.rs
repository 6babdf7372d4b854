//! Expression evaluation.
//!
//! Sanitizes the expression, brings every literal into decimal, then runs a
//! shunting-yard pass over the tokens and evaluates the resulting RPN with
//! exact arithmetic. Successful results are memoized per evaluator.

use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use tracing::{debug, trace};

use super::base::{Base, Mode};
use super::cache::{DEFAULT_CAPACITY, EvaluationCache};
use super::convert::convert;
use super::number::NumericValue;
use super::sanitize::sanitize;
use crate::error::{CalcError, Result};

lazy_static! {
    /// A division whose divisor is a literal zero, e.g. `5/0` or `5 ÷ 0.00`.
    static ref DIVISION_BY_ZERO: Regex =
        Regex::new(r"[/÷]\s*0+(?:\.0*)?\s*(?:$|[^0-9A-Fa-f.])").unwrap();
}

/// Options that shape a single evaluation. Part of the cache key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EvalOptions {
    /// Base the literals are written in.
    pub base: Base,
    pub mode: Mode,
    /// Sanitizer length limit; the mode default when unset.
    pub max_length: Option<usize>,
    /// Largest accepted result; `i64::MAX` when unset.
    pub max_value: Option<NumericValue>,
    /// Smallest accepted result; `-i64::MAX` when unset.
    pub min_value: Option<NumericValue>,
}

impl EvalOptions {
    pub fn new(base: Base, mode: Mode) -> Self {
        Self {
            base,
            mode,
            ..Default::default()
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_bounds(mut self, min_value: NumericValue, max_value: NumericValue) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    fn max_length(&self) -> usize {
        self.max_length.unwrap_or_else(|| self.mode.default_max_length())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Neg,
    Pos,
}

impl Operator {
    /// Priority and right associativity.
    fn priority(self) -> (i32, bool) {
        match self {
            Self::Neg | Self::Pos => (20, true),
            Self::Mul | Self::Div | Self::Rem => (12, false),
            Self::Add | Self::Sub => (8, false),
            Self::Shl | Self::Shr => (5, false),
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, Self::Neg | Self::Pos)
    }

    fn apply_unary(self, v: NumericValue) -> NumericValue {
        match self {
            Self::Neg => -v,
            _ => v,
        }
    }

    fn apply_binary(self, lhs: NumericValue, rhs: NumericValue) -> Result<NumericValue> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div => lhs.checked_div(&rhs),
            Self::Rem => lhs.checked_rem(&rhs),
            Self::Shl => lhs.shift(&rhs, true),
            Self::Shr => lhs.shift(&rhs, false),
            Self::Neg | Self::Pos => Err(CalcError::invalid_expression("misplaced sign")),
        }
    }
}

#[derive(Clone, Debug)]
enum Token {
    Num(NumericValue),
    Op(Operator),
    Open,
    Close,
}

#[derive(Clone, Debug)]
enum Entry {
    Val(NumericValue),
    Op(Operator),
    Open,
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => {}
            '0'..='9' | '.' => {
                let start = i;
                while chars
                    .get(i + 1)
                    .is_some_and(|next| next.is_ascii_digit() || *next == '.')
                {
                    i += 1;
                }
                let literal: String = chars[start..=i].iter().collect();
                let value = literal.parse::<NumericValue>().map_err(|_| {
                    CalcError::invalid_expression(format!("malformed number '{literal}'"))
                })?;
                tokens.push(Token::Num(value));
            }
            '+' => tokens.push(Token::Op(Operator::Add)),
            '-' => tokens.push(Token::Op(Operator::Sub)),
            '*' => tokens.push(Token::Op(Operator::Mul)),
            '/' => tokens.push(Token::Op(Operator::Div)),
            '%' => tokens.push(Token::Op(Operator::Rem)),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '<' | '>' if chars.get(i + 1) == Some(&c) => {
                tokens.push(Token::Op(if c == '<' { Operator::Shl } else { Operator::Shr }));
                i += 1;
            }
            _ => return Err(CalcError::invalid_expression(format!("unexpected '{c}'"))),
        }
        i += 1;
    }

    Ok(tokens)
}

// move operators from the queue to output while the top operator binds
// at least as tightly as `priority`
fn pop_while_priority(queue: &mut Vec<Entry>, output: &mut Vec<Entry>, priority: i32) {
    while let Some(Entry::Op(top)) = queue.last() {
        let (p, right) = top.priority();
        if p > priority || (p == priority && !right) {
            output.push(Entry::Op(*top));
            queue.pop();
        } else {
            return;
        }
    }
}

/// Convert infix tokens into reverse polish order.
fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Entry>> {
    let mut queue: Vec<Entry> = Vec::new();
    let mut output: Vec<Entry> = Vec::new();
    let mut expect_operand = true;
    // the previous token was an operator, so only a `-` sign may follow
    let mut after_operator = false;

    for token in tokens {
        match token {
            Token::Num(v) => {
                if !expect_operand {
                    return Err(CalcError::invalid_expression("missing operator"));
                }
                output.push(Entry::Val(v));
                expect_operand = false;
            }
            Token::Open => {
                if !expect_operand {
                    return Err(CalcError::invalid_expression("missing operator before '('"));
                }
                queue.push(Entry::Open);
                after_operator = false;
            }
            Token::Close => {
                if expect_operand {
                    return Err(CalcError::invalid_expression("incomplete group"));
                }
                loop {
                    match queue.pop() {
                        Some(Entry::Open) => break,
                        Some(e) => output.push(e),
                        None => {
                            return Err(CalcError::invalid_expression("unbalanced parentheses"));
                        }
                    }
                }
            }
            Token::Op(op) if expect_operand => {
                // only a sign may start an operand
                let unary = match op {
                    Operator::Sub => Operator::Neg,
                    Operator::Add if !after_operator => Operator::Pos,
                    _ => return Err(CalcError::invalid_expression("consecutive operators")),
                };
                queue.push(Entry::Op(unary));
                after_operator = true;
            }
            Token::Op(op) => {
                pop_while_priority(&mut queue, &mut output, op.priority().0);
                queue.push(Entry::Op(op));
                expect_operand = true;
                after_operator = true;
            }
        }
    }

    if expect_operand {
        return Err(CalcError::invalid_expression("expression ends with an operator"));
    }
    while let Some(e) = queue.pop() {
        match e {
            Entry::Open => return Err(CalcError::invalid_expression("unbalanced parentheses")),
            e => output.push(e),
        }
    }
    Ok(output)
}

fn calculate(rpn: Vec<Entry>) -> Result<NumericValue> {
    let mut values: Vec<NumericValue> = Vec::new();
    for entry in rpn {
        match entry {
            Entry::Val(v) => values.push(v),
            Entry::Op(op) if op.is_unary() => {
                let v = values
                    .pop()
                    .ok_or_else(|| CalcError::invalid_expression("missing operand"))?;
                values.push(op.apply_unary(v));
            }
            Entry::Op(op) => {
                let rhs = values.pop();
                let lhs = values.pop();
                let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                    return Err(CalcError::invalid_expression("missing operand"));
                };
                values.push(op.apply_binary(lhs, rhs)?);
            }
            Entry::Open => return Err(CalcError::invalid_expression("unbalanced parentheses")),
        }
    }

    match (values.pop(), values.is_empty()) {
        (Some(v), true) => Ok(v),
        _ => Err(CalcError::invalid_expression("too many numbers")),
    }
}

/// Evaluate a sanitized, decimal-only expression.
pub fn evaluate_decimal(expr: &str) -> Result<NumericValue> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(CalcError::invalid_expression("nothing to evaluate"));
    }
    calculate(to_rpn(tokens)?)
}

/// Expression evaluator with a memoizing cache.
///
/// Construct one per host and share it by reference. The cache uses interior
/// mutability and is not `Sync`; hosts with concurrent callers need one
/// evaluator per thread or external serialization.
#[derive(Debug)]
pub struct Evaluator {
    cache: RefCell<EvaluationCache<(String, EvalOptions), NumericValue>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: RefCell::new(EvaluationCache::new(capacity)),
        }
    }

    /// Evaluate `expr` under `options`.
    ///
    /// Empty input is zero. A literal division by zero is reported before any
    /// parsing; malformed or over-length input is always an error, never a
    /// partial result.
    pub fn evaluate(&self, expr: &str, options: &EvalOptions) -> Result<NumericValue> {
        if expr.trim().is_empty() {
            return Ok(NumericValue::zero());
        }

        let key = (expr.to_string(), options.clone());
        if let Some(value) = self.cache.borrow_mut().get(&key) {
            trace!(expression = expr, "evaluation cache hit");
            return Ok(value);
        }

        let value = self.evaluate_uncached(expr, options).map_err(|err| {
            debug!(expression = expr, error = %err, "evaluation failed");
            err
        })?;

        if let Some(evicted) = self.cache.borrow_mut().insert(key, value.clone()) {
            trace!(expression = %evicted.0, "evicted from evaluation cache");
        }
        Ok(value)
    }

    fn evaluate_uncached(&self, expr: &str, options: &EvalOptions) -> Result<NumericValue> {
        if DIVISION_BY_ZERO.is_match(expr) {
            return Err(CalcError::DivisionByZero);
        }

        // over-length input is rejected whole, never truncated
        let sanitized = sanitize(expr, options.base, options.mode, usize::MAX);
        let limit = options.max_length();
        if sanitized.chars().count() > limit {
            return Err(CalcError::LengthLimitExceeded(limit));
        }
        let decimal = if options.base.is_decimal() {
            sanitized
        } else {
            convert(&sanitized, options.base, Base::Dec)?
        };
        debug!(expression = expr, decimal = %decimal, "evaluating");

        let value = evaluate_decimal(&decimal)?;

        let max = options.max_value.clone().unwrap_or_else(NumericValue::max_i64);
        let min = options.min_value.clone().unwrap_or_else(NumericValue::min_i64);
        if value > max || value < min {
            return Err(CalcError::Overflow);
        }
        Ok(value)
    }

    /// Drop every memoized result, e.g. after a settings change.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<NumericValue> {
        Evaluator::new().evaluate(expr, &EvalOptions::default())
    }

    fn num(s: &str) -> NumericValue {
        s.parse().unwrap()
    }

    #[test]
    fn test_basic_evaluation() {
        assert_eq!(eval("2 + 2"), Ok(num("4")));
        assert_eq!(eval("2 + 3 × 4"), Ok(num("14")));
        assert_eq!(eval("(2 + 3) × 4"), Ok(num("20")));
        assert_eq!(eval("10 - 4 - 3"), Ok(num("3")));
        assert_eq!(eval("100 ÷ 4 ÷ 5"), Ok(num("5")));
        assert_eq!(eval("7 % 4"), Ok(num("3")));
        assert_eq!(eval("0.1 + 0.2"), Ok(num("0.3")));
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(eval(""), Ok(NumericValue::zero()));
        assert_eq!(eval("   "), Ok(NumericValue::zero()));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("3 × - 4"), Ok(num("-12")));
        assert_eq!(eval("3 × -4"), Ok(num("-12")));
        assert_eq!(eval("-5 + 2"), Ok(num("-3")));
        assert_eq!(eval("2 - -3"), Ok(num("5")));
        assert_eq!(eval("-(2 + 3)"), Ok(num("-5")));
        assert_eq!(eval("+5 - 2"), Ok(num("3")));
        assert_eq!(eval("2 × (+3)"), Ok(num("6")));
    }

    #[test]
    fn test_plus_after_operator_is_rejected() {
        for expr in ["2 + + 3", "2 × +3", "2 - + 3", "-+3"] {
            assert!(
                matches!(eval(expr), Err(CalcError::InvalidExpression(_))),
                "expected invalid: {expr}"
            );
        }
    }

    #[test]
    fn test_over_length_input_is_rejected() {
        let terms = vec!["1"; 15].join(" + ");
        assert_eq!(terms.len(), 57);
        assert_eq!(eval(&terms), Err(CalcError::LengthLimitExceeded(50)));

        let roomy = EvalOptions::default().with_max_length(60);
        assert_eq!(Evaluator::new().evaluate(&terms, &roomy), Ok(num("15")));

        // collapsed whitespace does not count against the limit
        let padded = format!("{}   ", vec!["1"; 12].join("  +  "));
        assert_eq!(eval(&padded), Ok(num("12")));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("5 ÷ 0"), Err(CalcError::DivisionByZero));
        assert_eq!(eval("5/0"), Err(CalcError::DivisionByZero));
        assert_eq!(eval("5 / 0.0 + 1"), Err(CalcError::DivisionByZero));
        assert_eq!(eval("5 / (2 - 2)"), Err(CalcError::DivisionByZero));
        assert_eq!(eval("5 % 0"), Err(CalcError::DivisionByZero));
        assert_eq!(eval("5 / 0.5"), Ok(num("10")));
        assert_eq!(eval("10 / 05"), Ok(num("2")));
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in ["2 × ( 3 + 4", "2 + 3)", "()", "2 * * 3", "1 2", "1.2.3 + 1", "(2)(3)"] {
            assert!(
                matches!(eval(expr), Err(CalcError::InvalidExpression(_))),
                "expected invalid: {expr}"
            );
        }
    }

    #[test]
    fn test_trailing_operator_is_ignored() {
        assert_eq!(eval("3 +"), Ok(num("3")));
    }

    #[test]
    fn test_overflow_boundary() {
        assert_eq!(eval("9223372036854775807"), Ok(NumericValue::max_i64()));
        assert_eq!(eval("9223372036854775807 + 1"), Err(CalcError::Overflow));
        assert_eq!(eval("0 - 9223372036854775807 - 1"), Err(CalcError::Overflow));
    }

    #[test]
    fn test_custom_bounds() {
        let options = EvalOptions::default().with_bounds(num("-10"), num("10"));
        let evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate("5 + 5", &options), Ok(num("10")));
        assert_eq!(evaluator.evaluate("5 + 6", &options), Err(CalcError::Overflow));
    }

    #[test]
    fn test_programmer_bases() {
        let evaluator = Evaluator::new();
        let hex = EvalOptions::new(Base::Hex, Mode::Programmer);
        assert_eq!(evaluator.evaluate("FF + 1", &hex), Ok(num("256")));
        assert_eq!(evaluator.evaluate("A / 0B", &hex), num("10").checked_div(&num("11")));
        assert_eq!(evaluator.evaluate("A / 0", &hex), Err(CalcError::DivisionByZero));

        let bin = EvalOptions::new(Base::Bin, Mode::Programmer);
        assert_eq!(evaluator.evaluate("1 << 100", &bin), Ok(num("16")));
        assert_eq!(evaluator.evaluate("101 + 1", &bin), Ok(num("6")));
        assert!(matches!(
            evaluator.evaluate("12 + 1", &bin),
            Err(CalcError::InvalidExpression(_))
        ));

        let dec = EvalOptions::new(Base::Dec, Mode::Programmer);
        assert_eq!(evaluator.evaluate("1 << 4 + 1", &dec), Ok(num("32")));
    }

    #[test]
    fn test_cache_memoizes() {
        let evaluator = Evaluator::new();
        let options = EvalOptions::default();
        assert_eq!(evaluator.cached_len(), 0);
        let first = evaluator.evaluate("1 ÷ 3", &options);
        let second = evaluator.evaluate("1 ÷ 3", &options);
        assert_eq!(first, second);
        assert_eq!(evaluator.cached_len(), 1);

        // failures are not cached
        let _ = evaluator.evaluate("1 ÷ 0", &options);
        assert_eq!(evaluator.cached_len(), 1);

        evaluator.clear_cache();
        assert_eq!(evaluator.cached_len(), 0);
    }

    #[test]
    fn test_cache_keyed_by_options() {
        let evaluator = Evaluator::new();
        let dec = EvalOptions::new(Base::Dec, Mode::Programmer);
        let hex = EvalOptions::new(Base::Hex, Mode::Programmer);
        assert_eq!(evaluator.evaluate("10", &dec), Ok(num("10")));
        assert_eq!(evaluator.evaluate("10", &hex), Ok(num("16")));
        assert_eq!(evaluator.cached_len(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let evaluator = Evaluator::with_capacity(3);
        let options = EvalOptions::default();
        for i in 0..10 {
            evaluator.evaluate(&format!("{i} + 1"), &options).unwrap();
        }
        assert_eq!(evaluator.cached_len(), 3);
    }
}
