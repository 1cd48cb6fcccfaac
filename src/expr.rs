use serde::Serialize;
use std::fmt;

use crate::token::Token;

/// A literal constant that appears directly in the source code.
///
/// The parser converts the token's payload at parse time, so literal leaves
/// don't keep the originating [`Token`] around.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Nil,

    Bool(bool),

    /// Integral lexemes such as `"3"` are still stored as `3.0`.
    Number(f64),

    /// String contents without surrounding quotes.
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    // number, string, true, false, nil
    Literal(LiteralValue),

    // ( expression )
    Grouping(Box<Expr>),

    // ! or - applied to an operand
    Unary(Token, Box<Expr>),

    // Arithmetic, comparison and equality operators
    Binary(Box<Expr>, Token, Box<Expr>),

    // Short-circuiting `and` / `or`
    Logical(Box<Expr>, Token, Box<Expr>),

    // Variable access
    Variable(Token),

    // name = value
    Assign(Token, Box<Expr>),

    // callee, closing paren (kept for error lines), arguments
    Call(Box<Expr>, Token, Vec<Expr>),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Nil => f.write_str("nil"),

            LiteralValue::Bool(b) => write!(f, "{}", b),

            LiteralValue::Number(n) => write!(f, "{}", n),

            LiteralValue::Str(s) => f.write_str(s),
        }
    }
}
