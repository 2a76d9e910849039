//! Formula tokenizer and recursive-descent parser.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! tree      := op (('+' | '-') op)*
//! op        := ['-' | '+'] single (('*' | '/') single)*   (leading sign
//!              only after nothing or '(')
//! single    := '(' tree ')' | number | variable | func '(' tree ')'
//!              , followed by any number of '^' exponents whose target
//!              must be a number, optionally in one pair of parentheses
//! ```
//!
//! A '-' directly before a digit fuses into a negative literal when the
//! preceding token is nothing or '('; otherwise a leading '-' becomes a
//! unary negation of the whole multiplicative chain. The parser builds a
//! binary tree and hands back its post-order traversal.

use super::{BuildError, Opcode};

/// Reserved function names, matched case-insensitively.
const MATH_FUNCS: &[(&str, Opcode)] = &[
    ("COS", Opcode::Cos),
    ("SIN", Opcode::Sin),
    ("TAN", Opcode::Tan),
    ("COT", Opcode::Cot),
    ("ABS", Opcode::Abs),
    ("SGN", Opcode::Sgn),
    ("SQRT", Opcode::Sqrt),
    ("LOG", Opcode::Log),
    ("EXP", Opcode::Exp),
    ("ASIN", Opcode::Asin),
    ("ACOS", Opcode::Acos),
    ("ATAN", Opcode::Atan),
    ("ACOT", Opcode::Acot),
    ("SINH", Opcode::Sinh),
    ("COSH", Opcode::Cosh),
    ("TANH", Opcode::Tanh),
    ("COTH", Opcode::Coth),
    ("LOG10", Opcode::Log10),
    ("STEP", Opcode::Step),
];

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    /// End of formula.
    End,
    LParen,
    RParen,
    Plus,
    Minus,
    Times,
    Divide,
    Pow,
    Number(f64),
    Variable(usize),
    Func(Opcode),
}

/// Binary expression tree; functions keep their argument on the left.
struct Tree {
    op: Opcode,
    left: Option<Box<Tree>>,
    right: Option<Box<Tree>>,
}

impl Tree {
    fn leaf(op: Opcode) -> Self {
        Self {
            op,
            left: None,
            right: None,
        }
    }

    fn unary(op: Opcode, arg: Tree) -> Self {
        Self {
            op,
            left: Some(Box::new(arg)),
            right: None,
        }
    }

    fn binary(op: Opcode, left: Tree, right: Tree) -> Self {
        Self {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Post-order emission: left, right, node.
    fn emit(&self, out: &mut Vec<Opcode>) {
        if let Some(left) = &self.left {
            left.emit(out);
        }
        if let Some(right) = &self.right {
            right.emit(out);
        }
        out.push(self.op);
    }
}

/// Parse state for a single build invocation.
struct Parser<'a, F> {
    src: &'a [u8],
    pos: usize,
    /// Token before `cur`; decides leading-sign handling.
    prev: Token,
    /// Most recently fetched token.
    cur: Token,
    bracket_count: i32,
    resolve: F,
}

pub(super) fn parse<F>(formula: &str, resolve: F) -> Result<Vec<Opcode>, BuildError>
where
    F: FnMut(&str) -> Option<usize>,
{
    let mut parser = Parser {
        src: formula.as_bytes(),
        pos: 0,
        prev: Token::End,
        cur: Token::End,
        bracket_count: 0,
        resolve,
    };
    let tree = parser.get_tree()?;
    if parser.bracket_count != 0 {
        return Err(BuildError::UnbalancedParens);
    }
    let mut ops = Vec::new();
    tree.emit(&mut ops);
    Ok(ops)
}

impl<F> Parser<'_, F>
where
    F: FnMut(&str) -> Option<usize>,
{
    /// tree := op (('+' | '-') op)*
    fn get_tree(&mut self) -> Result<Tree, BuildError> {
        let (mut left, mut lex) = self.get_op()?;
        loop {
            match lex {
                Token::End => break,
                Token::RParen => {
                    self.bracket_count -= 1;
                    break;
                }
                Token::Plus | Token::Minus => {
                    let op = if lex == Token::Plus {
                        Opcode::Add
                    } else {
                        Opcode::Sub
                    };
                    let (right, next) = self.get_op()?;
                    left = Tree::binary(op, left, right);
                    lex = next;
                }
                _ => return Err(BuildError::MissingOperator),
            }
        }
        Ok(left)
    }

    /// op := ['-' | '+'] single (('*' | '/') single)*
    ///
    /// A leading '-' negates the whole multiplicative chain.
    fn get_op(&mut self) -> Result<(Tree, Token), BuildError> {
        let mut lex = self.next_token()?;
        let mut negated = false;
        if matches!(self.prev, Token::End | Token::LParen) {
            if lex == Token::Minus {
                negated = true;
                lex = self.next_token()?;
            } else if lex == Token::Plus {
                lex = self.next_token()?;
            }
        }
        let (mut left, mut lex) = self.get_single_op(lex)?;
        while matches!(lex, Token::Times | Token::Divide) {
            let op = if lex == Token::Times {
                Opcode::Mul
            } else {
                Opcode::Div
            };
            let next = self.next_token()?;
            let (right, after) = self.get_single_op(next)?;
            left = Tree::binary(op, left, right);
            lex = after;
        }
        if negated {
            left = Tree::unary(Opcode::Negate, left);
        }
        Ok((left, lex))
    }

    /// single := '(' tree ')' | number | variable | func '(' tree ')',
    /// then any chain of '^' exponents.
    fn get_single_op(&mut self, lex: Token) -> Result<(Tree, Token), BuildError> {
        let mut left = match lex {
            Token::LParen => {
                self.bracket_count += 1;
                self.get_tree()?
            }
            Token::Number(value) => Tree::leaf(Opcode::Number(value)),
            Token::Variable(index) => Tree::leaf(Opcode::Variable(index)),
            Token::Func(op) => {
                if self.next_token()? != Token::LParen {
                    return Err(BuildError::FunctionWithoutParen);
                }
                self.bracket_count += 1;
                let arg = self.get_tree()?;
                Tree::unary(op, arg)
            }
            _ => return Err(BuildError::MissingOperand),
        };

        let mut lex = self.next_token()?;

        // Exponentiation binds to the preceding singleton; the exponent
        // must be a literal, optionally inside one pair of parentheses
        // (those are consumed here and never enter the bracket count).
        while lex == Token::Pow {
            lex = self.next_token()?;
            let bracketed = lex == Token::LParen;
            if bracketed {
                lex = self.next_token()?;
            }
            let Token::Number(value) = lex else {
                return Err(BuildError::ExponentNotNumber);
            };
            left = Tree::binary(Opcode::Pow, left, Tree::leaf(Opcode::Number(value)));
            if bracketed && self.next_token()? != Token::RParen {
                return Err(BuildError::UnbalancedParens);
            }
            lex = self.next_token()?;
        }
        Ok((left, lex))
    }

    /// Fetch the next token, updating the one-token lookbehind.
    fn next_token(&mut self) -> Result<Token, BuildError> {
        let token = self.scan_token()?;
        self.prev = self.cur;
        self.cur = token;
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token, BuildError> {
        while self.pos < self.src.len() && self.src[self.pos] == b' ' {
            self.pos += 1;
        }
        if self.pos >= self.src.len() {
            return Ok(Token::End);
        }
        let c = self.src[self.pos];
        self.pos += 1;
        match c {
            b'(' => Ok(Token::LParen),
            b')' => Ok(Token::RParen),
            b'+' => Ok(Token::Plus),
            b'*' => Ok(Token::Times),
            b'/' => Ok(Token::Divide),
            b'^' => Ok(Token::Pow),
            b'-' => {
                // Fuse into a negative literal when a number can start
                // here: after nothing or an opening parenthesis.
                if self.pos < self.src.len()
                    && self.src[self.pos].is_ascii_digit()
                    && matches!(self.cur, Token::End | Token::LParen)
                {
                    let value = self.scan_number()?;
                    Ok(Token::Number(-value))
                } else {
                    Ok(Token::Minus)
                }
            }
            b'0'..=b'9' => {
                self.pos -= 1;
                let value = self.scan_number()?;
                Ok(Token::Number(value))
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                self.pos -= 1;
                self.scan_name()
            }
            other => Err(BuildError::UnexpectedChar(other as char)),
        }
    }

    /// number := digits ['.' digits] ['E' ['+'|'-'] digits]
    fn scan_number(&mut self) -> Result<f64, BuildError> {
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos < self.src.len() && self.src[self.pos] == b'.' {
            self.pos += 1;
            while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if self.pos < self.src.len() && matches!(self.src[self.pos], b'e' | b'E') {
            self.pos += 1;
            if self.pos < self.src.len() && matches!(self.src[self.pos], b'+' | b'-') {
                self.pos += 1;
            }
            if self.pos >= self.src.len() || !self.src[self.pos].is_ascii_digit() {
                return Err(BuildError::MalformedNumber);
            }
            while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii digits");
        text.parse().map_err(|_| BuildError::MalformedNumber)
    }

    /// Identifier: a reserved function name or a caller variable.
    fn scan_name(&mut self) -> Result<Token, BuildError> {
        let start = self.pos;
        while self.pos < self.src.len() && is_name_char(self.src[self.pos]) {
            self.pos += 1;
        }
        let name = std::str::from_utf8(&self.src[start..self.pos]).expect("ascii name");
        for (func, op) in MATH_FUNCS {
            if name.eq_ignore_ascii_case(func) {
                return Ok(Token::Func(*op));
            }
        }
        match (self.resolve)(name) {
            Some(index) => Ok(Token::Variable(index)),
            None => Err(BuildError::UnknownName(name.to_string())),
        }
    }
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(formula: &str) -> Result<Vec<Opcode>, BuildError> {
        parse(formula, |name| {
            if name.eq_ignore_ascii_case("A") {
                Some(0)
            } else if name.eq_ignore_ascii_case("B_2") {
                Some(1)
            } else {
                None
            }
        })
    }

    #[test]
    fn test_postfix_order() {
        // 2 + 3*4 emits operands before operators, tighter ops first.
        let ops = build("2 + 3*4").unwrap();
        assert_eq!(
            ops,
            vec![
                Opcode::Number(2.0),
                Opcode::Number(3.0),
                Opcode::Number(4.0),
                Opcode::Mul,
                Opcode::Add,
            ]
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let ops = build("(2 + 3)*4").unwrap();
        assert_eq!(
            ops,
            vec![
                Opcode::Number(2.0),
                Opcode::Number(3.0),
                Opcode::Add,
                Opcode::Number(4.0),
                Opcode::Mul,
            ]
        );
    }

    #[test]
    fn test_negative_literal_fuses_after_paren() {
        let ops = build("(-2)*3").unwrap();
        assert_eq!(ops[0], Opcode::Number(-2.0));
    }

    #[test]
    fn test_leading_minus_negates_whole_chain() {
        // -A*3 parses as -(A*3): one trailing negate.
        let ops = build("-A*3").unwrap();
        assert_eq!(
            ops,
            vec![
                Opcode::Variable(0),
                Opcode::Number(3.0),
                Opcode::Mul,
                Opcode::Negate,
            ]
        );
    }

    #[test]
    fn test_exponent_forms() {
        assert!(build("2^3").is_ok());
        assert!(build("2^(3)").is_ok());
        assert!(build("2^(-3)").is_ok());
        assert_eq!(build("2^A"), Err(BuildError::ExponentNotNumber));
        assert_eq!(build("2^(A)"), Err(BuildError::ExponentNotNumber));
    }

    #[test]
    fn test_number_with_exponent_suffix() {
        let ops = build("1.5E+2").unwrap();
        assert_eq!(ops, vec![Opcode::Number(150.0)]);
        assert_eq!(build("2E"), Err(BuildError::MalformedNumber));
        assert_eq!(build("2E+"), Err(BuildError::MalformedNumber));
    }

    #[test]
    fn test_function_requires_paren() {
        assert!(build("COS(A)").is_ok());
        assert_eq!(build("COS A"), Err(BuildError::FunctionWithoutParen));
    }

    #[test]
    fn test_function_names_case_insensitive() {
        assert_eq!(build("sqrt(4)").unwrap(), build("SQRT(4)").unwrap());
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(build("(2+3"), Err(BuildError::UnbalancedParens));
        assert_eq!(build("2+3)"), Err(BuildError::UnbalancedParens));
    }

    #[test]
    fn test_missing_operand_and_operator() {
        assert_eq!(build(""), Err(BuildError::MissingOperand));
        assert_eq!(build("2*"), Err(BuildError::MissingOperand));
        assert_eq!(build("2 3"), Err(BuildError::MissingOperator));
    }

    #[test]
    fn test_underscored_variable() {
        let ops = build("B_2 + 1").unwrap();
        assert_eq!(ops[0], Opcode::Variable(1));
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(build("2 % 3"), Err(BuildError::UnexpectedChar('%')));
    }
}
