use serde::Serialize;
use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function declaration.  Shared behind an `Rc` so the runtime function
/// value can point at the same body the AST owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (at most 255 are accepted without an error).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    // name, optional initializer
    Var(Token, Option<Expr>),

    Block(Vec<Stmt>),

    // condition, then branch, optional else branch
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),

    // `for` loops are desugared into this as well
    While(Expr, Box<Stmt>),

    Function(Rc<FunctionDecl>),

    // `return` keyword, optional value
    Return(Token, Option<Expr>),
}
