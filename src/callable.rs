//! Invocation contract shared by user-defined and native functions.

use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::ScopeId;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// Anything invocable with a fixed argument count.
///
/// The interpreter checks the arity before calling, so `call` may assume
/// `arguments.len() == self.arity()`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `paren` is the closing parenthesis of the call site, used for error
    /// lines.
    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value>;
}

/// A function declared in Lox source.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: ScopeId,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: ScopeId) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        _paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let scope: ScopeId = interpreter.environment_mut().push(self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.lexeme, argument);

            interpreter
                .environment_mut()
                .define(scope, &param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, scope)? {
            Flow::Return(value) => {
                debug!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// A built-in function implemented in Rust.  Errors are plain messages; the
/// call site's line is attached when they surface.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        _interpreter: &mut Interpreter<W>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|msg| LoxError::runtime(paren, msg))
    }
}

/// Built-ins installed in every fresh global scope.
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    }]
}

/// Seconds since the Unix epoch, with microsecond resolution.
fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let seconds: f64 = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

    info!("Native function 'clock' returned: {}", seconds);

    Ok(Value::Number(seconds))
}
