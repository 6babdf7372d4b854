//! End-to-end calculator scenarios through the public API.

use abacus::calculator::{
    Base, EditorState, EvalOptions, Evaluator, FormatOptions, Key, Mode, NumericValue, calculate,
    format_value,
};
use abacus::{CalcError, Editor, ErrorKind, Settings};

fn press(editor: &mut Editor, evaluator: &Evaluator, keys: &str) {
    for label in keys.split_whitespace() {
        let key: Key = label.parse().unwrap();
        editor.press(key, evaluator);
    }
}

fn decimal() -> EvalOptions {
    EvalOptions::new(Base::Dec, Mode::Standard)
}

#[test]
fn test_overflow_boundary() {
    let evaluator = Evaluator::new();
    assert_eq!(
        evaluator.evaluate("9223372036854775807 + 1", &decimal()),
        Err(CalcError::Overflow)
    );
    assert_eq!(
        evaluator.evaluate("9223372036854775806 + 1", &decimal()),
        Ok(NumericValue::max_i64())
    );

    let programmer = EvalOptions::new(Base::Dec, Mode::Programmer);
    assert_eq!(evaluator.evaluate("1 << 63", &programmer), Err(CalcError::Overflow));
    assert!(evaluator.evaluate("1 << 62", &programmer).is_ok());
}

#[test]
fn test_division_by_zero_forms() {
    let evaluator = Evaluator::new();
    for expr in ["5 ÷ 0", "5/0", "5 / 0.0", "(2 + 3) ÷ 0"] {
        assert_eq!(
            evaluator.evaluate(expr, &decimal()),
            Err(CalcError::DivisionByZero),
            "{expr}"
        );
    }
    assert_eq!(evaluator.cached_len(), 0);
}

#[test]
fn test_backspace_removes_operator_token() {
    let evaluator = Evaluator::new();
    let mut editor = Editor::new(Settings::default());
    press(&mut editor, &evaluator, "1 2 +");
    assert_eq!(editor.input(), "12 + ");
    editor.press(Key::Backspace, &evaluator);
    assert_eq!(editor.input(), "12");
}

#[test]
fn test_base_grouping() {
    let value = NumericValue::from(255);
    let grouped = |base| FormatOptions {
        base,
        mode: Mode::Programmer,
        use_thousands_separator: true,
        ..Default::default()
    };
    assert_eq!(format_value(&value, &grouped(Base::Hex)), "FF");
    assert_eq!(format_value(&value, &grouped(Base::Bin)), "1111 1111");
    assert_eq!(format_value(&value, &grouped(Base::Oct)), "377");
}

#[test]
fn test_unbalanced_parentheses_until_clear() {
    let evaluator = Evaluator::new();
    let mut editor = Editor::new(Settings::default());
    press(&mut editor, &evaluator, "2 × ( 3 + 4");
    assert_eq!(editor.input(), "2 × ( 3 + 4");

    editor.press(Key::Equals, &evaluator);
    let EditorState::Error(err) = editor.state() else {
        panic!("expected error state");
    };
    assert_eq!(err.kind(), ErrorKind::InvalidExpression);
    assert!(editor.display().starts_with("Invalid expression"));
    assert_eq!(editor.parens().count(), 1);

    editor.press(Key::Clear, &evaluator);
    assert_eq!(editor.parens().count(), 0);
    assert_eq!(editor.state(), EditorState::Idle);
}

#[test]
fn test_fraction_display() {
    let settings = Settings {
        precision: 4,
        use_fractions: true,
        ..Default::default()
    };
    let outcome = calculate("1 ÷ 3", &settings, &Evaluator::new());
    assert_eq!(outcome.display(), "1/3");
    assert_eq!(outcome.plain(), "0.3333");

    let evaluator = Evaluator::new();
    let mut editor = Editor::new(settings);
    press(&mut editor, &evaluator, "1 ÷ 3 =");
    assert_eq!(editor.input(), "1/3");
}

#[test]
fn test_programmer_session() {
    let settings = Settings {
        mode: Mode::Programmer,
        base: Base::Hex,
        use_thousands_separator: true,
        ..Default::default()
    };
    let evaluator = Evaluator::new();
    let mut editor = Editor::new(settings);
    press(&mut editor, &evaluator, "F F << 8 =");
    assert_eq!(editor.input(), "FF 00");

    editor.set_base(Base::Bin);
    assert_eq!(editor.input(), "1111 1111 0000 0000");
    editor.set_base(Base::Dec);
    assert_eq!(editor.input(), "65,280");
}

#[test]
fn test_settings_file_drives_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "use_thousands_separator = true\nprecision = 2\n").unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    let outcome = calculate("1234567 ÷ 8", &settings, &Evaluator::new());
    assert_eq!(outcome.display(), "154,320.88");
}

#[test]
fn test_over_length_expression_fails() {
    let expression = vec!["1"; 15].join(" + ");
    let outcome = calculate(&expression, &Settings::default(), &Evaluator::new());
    assert!(!outcome.is_success());
    assert_eq!(outcome.display(), "Maximum length of 50 characters reached");
}
