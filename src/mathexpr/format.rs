//! Postfix-to-infix rendering.
//!
//! Walks the program with a string stack, parenthesizing every binary
//! operation so the output needs no precedence knowledge. The rendering
//! stays inside the grammar the parser accepts: negative literals appear
//! only behind an opening parenthesis (where they fuse back into one
//! token) and exponents are wrapped in exactly one pair of parentheses.

use super::Opcode;

fn func_name(op: Opcode) -> &'static str {
    match op {
        Opcode::Cos => "COS",
        Opcode::Sin => "SIN",
        Opcode::Tan => "TAN",
        Opcode::Cot => "COT",
        Opcode::Abs => "ABS",
        Opcode::Sgn => "SGN",
        Opcode::Sqrt => "SQRT",
        Opcode::Log => "LOG",
        Opcode::Exp => "EXP",
        Opcode::Asin => "ASIN",
        Opcode::Acos => "ACOS",
        Opcode::Atan => "ATAN",
        Opcode::Acot => "ACOT",
        Opcode::Sinh => "SINH",
        Opcode::Cosh => "COSH",
        Opcode::Tanh => "TANH",
        Opcode::Coth => "COTH",
        Opcode::Log10 => "LOG10",
        Opcode::Step => "STEP",
        _ => unreachable!("not a function opcode"),
    }
}

/// Render a number so the tokenizer reads back the same value.
fn number(value: f64) -> String {
    if value.is_sign_negative() {
        // A bare minus only fuses after '(' or at the start.
        format!("({value})")
    } else {
        format!("{value}")
    }
}

pub(super) fn format<F>(ops: &[Opcode], mut name: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut stack: Vec<String> = Vec::new();
    for op in ops {
        match *op {
            Opcode::Number(value) => stack.push(number(value)),
            Opcode::Variable(index) => stack.push(name(index)),
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let right = stack.pop().expect("binary operator needs two operands");
                let left = stack.pop().expect("binary operator needs two operands");
                let sym = match op {
                    Opcode::Add => "+",
                    Opcode::Sub => "-",
                    Opcode::Mul => "*",
                    _ => "/",
                };
                stack.push(format!("({left} {sym} {right})"));
            }
            Opcode::Pow => {
                // The parser guarantees a literal exponent; re-render it
                // raw inside the single permitted parenthesis pair.
                let right = stack.pop().expect("exponent operand");
                let left = stack.pop().expect("power base operand");
                let raw = right.trim_start_matches('(').trim_end_matches(')');
                stack.push(format!("({left} ^ ({raw}))"));
            }
            Opcode::Negate => {
                let arg = stack.pop().expect("negate operand");
                stack.push(format!("(-({arg}))"));
            }
            func => {
                let arg = stack.pop().expect("function operand");
                stack.push(format!("{}({arg})", func_name(func)));
            }
        }
    }
    stack.pop().unwrap_or_default()
}
