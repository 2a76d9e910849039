//! Postfix program execution.
//!
//! A fixed-size value stack and a linear walk over the opcodes; no
//! allocation. Domain errors (log of a non-positive number, square root
//! of a negative, a vanishing cotangent denominator, powers of
//! non-positive bases) are clipped to zero rather than producing NaN,
//! and a NaN that still reaches the end of the program is coerced to
//! zero. Each opcode maps to one concrete sequence of IEEE operations;
//! nothing here may be reassociated or contracted across opcodes.

use super::Opcode;

/// Value-stack capacity; far deeper than any one-line formula nests.
const STACK_SIZE: usize = 1024;

pub(super) fn evaluate<F>(ops: &[Opcode], mut var: F) -> f64
where
    F: FnMut(usize) -> f64,
{
    let mut stack = [0.0_f64; STACK_SIZE];
    let mut top: usize = 0;

    for op in ops {
        match *op {
            Opcode::Number(value) => {
                top += 1;
                if top >= STACK_SIZE {
                    return 0.0;
                }
                stack[top] = value;
            }
            Opcode::Variable(index) => {
                top += 1;
                if top >= STACK_SIZE {
                    return 0.0;
                }
                stack[top] = var(index);
            }

            Opcode::Add => {
                let r = stack[top];
                top -= 1;
                stack[top] += r;
            }
            Opcode::Sub => {
                let r = stack[top];
                top -= 1;
                stack[top] -= r;
            }
            Opcode::Mul => {
                let r = stack[top];
                top -= 1;
                stack[top] *= r;
            }
            Opcode::Div => {
                // Division stays unchecked; a zero divisor is the
                // caller's responsibility.
                let r = stack[top];
                top -= 1;
                stack[top] /= r;
            }
            Opcode::Pow => {
                let exponent = stack[top];
                top -= 1;
                let base = stack[top];
                stack[top] = if base <= 0.0 {
                    0.0
                } else {
                    (exponent * base.ln()).exp()
                };
            }

            Opcode::Negate => stack[top] = -stack[top],
            Opcode::Cos => stack[top] = stack[top].cos(),
            Opcode::Sin => stack[top] = stack[top].sin(),
            Opcode::Tan => stack[top] = stack[top].tan(),
            Opcode::Cot => {
                let r = stack[top];
                stack[top] = if r == 0.0 { 0.0 } else { 1.0 / r.tan() };
            }
            Opcode::Abs => stack[top] = stack[top].abs(),
            Opcode::Sgn => {
                let r = stack[top];
                stack[top] = if r < 0.0 {
                    -1.0
                } else if r > 0.0 {
                    1.0
                } else {
                    0.0
                };
            }
            Opcode::Sqrt => {
                let r = stack[top];
                stack[top] = if r < 0.0 { 0.0 } else { r.sqrt() };
            }
            Opcode::Log => {
                let r = stack[top];
                stack[top] = if r <= 0.0 { 0.0 } else { r.ln() };
            }
            Opcode::Log10 => {
                let r = stack[top];
                stack[top] = if r <= 0.0 { 0.0 } else { r.log10() };
            }
            Opcode::Exp => stack[top] = stack[top].exp(),
            Opcode::Asin => stack[top] = stack[top].asin(),
            Opcode::Acos => stack[top] = stack[top].acos(),
            Opcode::Atan => stack[top] = stack[top].atan(),
            Opcode::Acot => stack[top] = std::f64::consts::FRAC_PI_2 - stack[top].atan(),
            Opcode::Sinh => {
                let r = stack[top];
                stack[top] = (r.exp() - (-r).exp()) / 2.0;
            }
            Opcode::Cosh => {
                let r = stack[top];
                stack[top] = (r.exp() + (-r).exp()) / 2.0;
            }
            Opcode::Tanh => {
                let r = stack[top];
                stack[top] = (r.exp() - (-r).exp()) / (r.exp() + (-r).exp());
            }
            Opcode::Coth => {
                let r = stack[top];
                let denom = r.exp() - (-r).exp();
                stack[top] = if denom == 0.0 {
                    0.0
                } else {
                    (r.exp() + (-r).exp()) / denom
                };
            }
            Opcode::Step => {
                stack[top] = if stack[top] <= 0.0 { 0.0 } else { 1.0 };
            }
        }
    }

    let result = stack[top];
    if result.is_nan() {
        0.0
    } else {
        result
    }
}
