//! Symbolic math expression evaluator.
//!
//! Parses a one-line infix arithmetic formula referencing named
//! variables into an immutable postfix program that can be re-evaluated
//! cheaply against different variable stores:
//!
//! ```
//! use dynwave::mathexpr::MathExpr;
//!
//! let expr = MathExpr::build("2*(A+3)^2 - STEP(A)", |name| {
//!     if name.eq_ignore_ascii_case("A") { Some(0) } else { None }
//! })
//! .unwrap();
//! let value = expr.evaluate(|_var| 5.0);
//! assert!((value - 127.0).abs() < 1e-12);
//! ```
//!
//! Variable names are resolved once at build time through a caller
//! callback; evaluation takes a second callback mapping the resolved
//! indices to values, so one program can be run against many stores.
//!
//! The parser builds a binary expression tree and emits it in post-order;
//! the tree is dropped once the program exists. Evaluation runs the
//! postfix program on a fixed-size value stack with no allocation and
//! clips math-domain errors to zero (the caller's iteration loop prefers
//! an occasional zero over a propagating NaN).

mod eval;
mod format;
mod parser;

use thiserror::Error;

/// One postfix program step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Opcode {
    /// Push a literal.
    Number(f64),
    /// Push the value of the variable with this build-time index.
    Variable(usize),
    Add,
    Sub,
    Mul,
    Div,
    /// Unary negation.
    Negate,
    /// Exponentiation; the parser guarantees a literal exponent.
    Pow,
    Cos,
    Sin,
    Tan,
    Cot,
    Abs,
    Sgn,
    Sqrt,
    Log,
    Exp,
    Asin,
    Acos,
    Atan,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Coth,
    Log10,
    /// 1 for positive arguments, 0 otherwise.
    Step,
}

/// Why a formula failed to build.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("malformed number")]
    MalformedNumber,
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("operator is missing an operand")]
    MissingOperand,
    #[error("function name must be followed by '('")]
    FunctionWithoutParen,
    #[error("exponent must be a number")]
    ExponentNotNumber,
    #[error("operands must be separated by an operator")]
    MissingOperator,
}

/// A compiled formula: an immutable postfix program.
#[derive(Clone, Debug, PartialEq)]
pub struct MathExpr {
    ops: Vec<Opcode>,
}

impl MathExpr {
    /// Compile `formula`, resolving variable names through `resolve`.
    ///
    /// `resolve` returns the index a name should evaluate under, or
    /// `None` for names it does not know (a build error).
    pub fn build<F>(formula: &str, resolve: F) -> Result<Self, BuildError>
    where
        F: FnMut(&str) -> Option<usize>,
    {
        let ops = parser::parse(formula, resolve)?;
        Ok(Self { ops })
    }

    /// Evaluate the program, reading variables through `var`.
    pub fn evaluate<F>(&self, var: F) -> f64
    where
        F: FnMut(usize) -> f64,
    {
        eval::evaluate(&self.ops, var)
    }

    /// Evaluate a program that uses no variables (unresolved variables
    /// read as zero).
    pub fn evaluate_constant(&self) -> f64 {
        eval::evaluate(&self.ops, |_| 0.0)
    }

    /// Render the program as a fully parenthesized infix formula that
    /// rebuilds to a numerically equivalent program. Variables render as
    /// `x<index>`.
    pub fn format(&self) -> String {
        self.format_with(|i| format!("x{i}"))
    }

    /// Render with caller-supplied variable names.
    pub fn format_with<F>(&self, name: F) -> String
    where
        F: FnMut(usize) -> String,
    {
        format::format(&self.ops, name)
    }

    /// The postfix program steps, in execution order.
    pub fn ops(&self) -> &[Opcode] {
        &self.ops
    }
}
