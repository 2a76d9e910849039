//! Integration tests for the expression evaluator.

use dynwave::mathexpr::{BuildError, MathExpr};

fn resolve(name: &str) -> Option<usize> {
    match name.to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "DEPTH" => Some(2),
        _ => None,
    }
}

fn eval_const(formula: &str) -> f64 {
    MathExpr::build(formula, |_| None)
        .unwrap()
        .evaluate_constant()
}

#[test]
fn test_reference_formula() {
    // 2·(5+3)² − STEP(5) = 128 − 1
    let expr = MathExpr::build("2*(A+3)^2 - STEP(A)", resolve).unwrap();
    assert!((expr.evaluate(|_| 5.0) - 127.0).abs() < 1e-12);
}

#[test]
fn test_constant_formulas_match_math() {
    let cases: &[(&str, f64)] = &[
        ("1 + 2 + 3 + 4", 10.0),
        ("2*3 + 4*5", 26.0),
        ("100/8/2", 6.25),
        ("2^(3) * 2", 16.0),
        ("(1 + 2)*(3 + 4)", 21.0),
        ("10 - 4 - 3", 3.0),
        ("-(2 + 3) + 10", 5.0),
        ("1.25E2 + 75", 200.0),
        ("ABS(3 - 10)", 7.0),
        ("SQRT(16) + COS(0)", 5.0),
    ];
    for (formula, expected) in cases {
        let got = eval_const(formula);
        assert!(
            (got - expected).abs() < 1e-9,
            "'{formula}' = {got}, expected {expected}"
        );
    }
}

#[test]
fn test_one_program_many_stores() {
    let expr = MathExpr::build("A*B + DEPTH", resolve).unwrap();
    let stores = [[2.0, 3.0, 1.0], [0.5, -4.0, 10.0], [0.0, 0.0, 0.0]];
    for store in stores {
        let got = expr.evaluate(|i| store[i]);
        let expected = store[0] * store[1] + store[2];
        assert!((got - expected).abs() < 1e-12);
    }
}

#[test]
fn test_case_insensitive_names() {
    let expr = MathExpr::build("depth + Depth + DEPTH", resolve).unwrap();
    assert_eq!(expr.evaluate(|_| 2.0), 6.0);
    let upper = MathExpr::build("sqrt(4) + SQRT(4)", |_| None).unwrap();
    assert_eq!(upper.evaluate_constant(), 4.0);
}

#[test]
fn test_build_errors() {
    assert_eq!(
        MathExpr::build("(1 + 2", resolve).unwrap_err(),
        BuildError::UnbalancedParens
    );
    assert_eq!(
        MathExpr::build("SIN 30", resolve).unwrap_err(),
        BuildError::FunctionWithoutParen
    );
    assert_eq!(
        MathExpr::build("2 ^ A", resolve).unwrap_err(),
        BuildError::ExponentNotNumber
    );
    assert_eq!(
        MathExpr::build("2 + UNKNOWN", resolve).unwrap_err(),
        BuildError::UnknownName("UNKNOWN".into())
    );
    assert_eq!(
        MathExpr::build("4E+", resolve).unwrap_err(),
        BuildError::MalformedNumber
    );
    assert!(MathExpr::build("", resolve).is_err());
}

#[test]
fn test_error_messages_are_one_line() {
    let err = MathExpr::build("(1 + 2", resolve).unwrap_err();
    let msg = err.to_string();
    assert!(!msg.is_empty());
    assert!(!msg.contains('\n'));
}

#[test]
fn test_format_round_trip() {
    let formulas = [
        "2*(A+3)^2 - STEP(A)",
        "SINH(B) + COSH(B)*TANH(A)",
        "-A/(B + 4.5) + LOG10(100)",
        "A^(-2) + 2^(0.5)",
    ];
    for formula in formulas {
        let expr = MathExpr::build(formula, resolve).unwrap();
        let rendered = expr.format_with(|i| ["A", "B", "DEPTH"][i].to_string());
        let rebuilt = MathExpr::build(&rendered, resolve)
            .unwrap_or_else(|e| panic!("'{rendered}' failed to rebuild: {e}"));
        let vars = |i: usize| [1.7, -0.3, 4.0][i];
        let a = expr.evaluate(vars);
        let b = rebuilt.evaluate(vars);
        assert!(
            (a - b).abs() <= 1e-12 * a.abs().max(1.0),
            "'{formula}' -> '{rendered}': {a} vs {b}"
        );
    }
}

#[test]
fn test_deeply_nested_formula() {
    // Build ((((1)+1)+1)...) to make sure recursion depth is sane for
    // realistic one-line formulas.
    let mut formula = String::from("1");
    for _ in 0..50 {
        formula = format!("({formula} + 1)");
    }
    assert_eq!(eval_const(&formula), 51.0);
}

#[test]
fn test_whitespace_insensitive() {
    assert_eq!(eval_const("1+2*3"), eval_const("1 + 2 * 3"));
    assert_eq!(eval_const("  SQRT( 16 )  "), 4.0);
}
