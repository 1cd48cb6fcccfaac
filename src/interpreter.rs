use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{self, Callable, LoxFunction};
use crate::environment::{Environment, ScopeId};
use crate::error::{LoxError, Result};
use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested calls before the interpreter gives up with a
/// `Stack overflow.` runtime error.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Remaining host stack below which a new segment is allocated before
/// recursing into `execute`/`evaluate`.
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each heap-allocated stack segment.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// How a statement finished.  `return` unwinds through blocks and loops as
/// `Flow::Return` until the enclosing call consumes it.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking evaluator.  All mutable state (scopes, the current scope,
/// call depth, the output stream) lives here, so independent interpreters
/// never interfere.
pub struct Interpreter<W: Write = io::Stdout> {
    environment: Environment,
    current: ScopeId,
    call_depth: usize,
    out: W,
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter printing to `out` and defines the native
    /// functions such as `clock`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let mut environment = Environment::new();

        for native in callable::natives() {
            debug!("Defining native function '{}'", native.name);

            environment.define(
                Environment::GLOBAL,
                native.name,
                Value::NativeFunction(Rc::new(native)),
            );
        }

        Self {
            environment,
            current: Environment::GLOBAL,
            call_depth: 0,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub(crate) fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub(crate) fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the rest; effects of earlier statements remain.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                debug!("Top-level return with {}, stopping", value);
                break;
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.  Deep nesting runs on heap-allocated
    /// stack segments, so only `MAX_CALL_DEPTH` bounds recursion.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.define(self.current, &name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = self.environment.push(self.current);
                self.execute_block(statements, scope)
            }

            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While(condition, body) => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                // Calls are enclosed by the global scope, not the scope the
                // declaration appears in: nested functions don't see the
                // locals of the function around them.
                let function = LoxFunction::new(Rc::clone(declaration), Environment::GLOBAL);

                debug!(
                    "Defining function '{}' with {} parameters",
                    declaration.name.lexeme,
                    declaration.params.len()
                );

                self.environment.define(
                    self.current,
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return(_keyword, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` with `scope` as the current scope, then releases the
    /// scope.  The previous scope is restored on every exit path, errors
    /// included.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], scope: ScopeId) -> Result<Flow> {
        let previous: ScopeId = self.current;
        self.current = scope;

        let mut result: Result<Flow> = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.current = previous;
        self.environment.pop(scope);

        result
    }

    // ──────────────────────────── expressions ──────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary(operator, right) => self.evaluate_unary(operator, right),

            Expr::Binary(left, operator, right) => self.evaluate_binary(left, operator, right),

            Expr::Logical(left, operator, right) => self.evaluate_logical(left, operator, right),

            Expr::Variable(name) => self.environment.get(self.current, name),

            Expr::Assign(name, value) => {
                let value = self.evaluate(value)?;
                self.environment
                    .assign(self.current, name, value.clone())?;
                Ok(value)
            }

            Expr::Call(callee, paren, arguments) => self.evaluate_call(callee, paren, arguments),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => {
                    debug!("Unary '-' applied to {}", other.type_name());
                    Err(LoxError::runtime(operator, "Operand must be a number."))
                }
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {} and {}",
            operator.lexeme,
            left.type_name(),
            right.type_name()
        );

        let value = match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(a + &b),
                _ => {
                    return Err(LoxError::runtime(
                        operator,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a - b)
            }

            // IEEE semantics: dividing by zero yields an infinity or NaN.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a / b)
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a * b)
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a > b)
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a >= b)
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a < b)
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a <= b)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left.is_equal(&right)),

            TokenType::BANG_EQUAL => Value::Bool(!left.is_equal(&right)),

            _ => return Err(LoxError::runtime(operator, "Invalid binary operator.")),
        };

        Ok(value)
    }

    /// `or` yields the left operand if truthy, `and` yields it if falsy;
    /// otherwise the right operand is evaluated and returned.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;

        let short_circuit = if operator.token_type == TokenType::OR {
            left.is_truthy()
        } else {
            !left.is_truthy()
        };

        if short_circuit {
            debug!("'{}' short-circuited", operator.lexeme);
            return Ok(left);
        }

        self.evaluate(right)
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        match self.evaluate(callee)? {
            Value::Function(function) => self.invoke(function.as_ref(), paren, arguments),

            Value::NativeFunction(native) => self.invoke(native.as_ref(), paren, arguments),

            other => {
                debug!("Attempted to call a {}", other.type_name());
                Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        }
    }

    /// Evaluates the arguments left to right, checks the arity and call
    /// depth, then hands over to the callable.
    fn invoke<C: Callable>(&mut self, callee: &C, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        if values.len() != callee.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callee.arity(),
                    values.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callee.call(self, paren, values);
        self.call_depth -= 1;

        result
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}
