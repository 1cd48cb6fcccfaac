//! Front end and tree-walking evaluator for the Lox scripting language.
//!
//! The pipeline is scan → parse → interpret:
//!
//! ```rust
//! use rox::Lox;
//!
//! let mut lox = Lox::with_writers(Vec::new(), Vec::new());
//! lox.run("print 1 + 2;").unwrap();
//!
//! assert_eq!(lox.output().as_slice(), b"3\n");
//! assert!(!lox.had_error());
//! ```

pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::{self, Write};

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::Token;

/// One interpreter session.  Globals persist across [`Lox::run`] calls, which
/// is what the REPL relies on.
///
/// Program output and runtime errors go to `W`; syntax errors go to `E`.
pub struct Lox<W: Write = io::Stdout, E: Write = io::Stderr> {
    interpreter: Interpreter<W>,
    diagnostics: E,
    had_error: bool,
    had_runtime_error: bool,
}

impl Lox<io::Stdout, io::Stderr> {
    pub fn new() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }
}

impl Default for Lox<io::Stdout, io::Stderr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write, E: Write> Lox<W, E> {
    pub fn with_writers(out: W, diagnostics: E) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            diagnostics,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Scan, parse and execute `source`.
    ///
    /// Every syntax error is reported; if there was any, nothing runs.  A
    /// runtime error is reported once and ends the run.  The `Err` case is
    /// reserved for failures writing to the output or diagnostic streams.
    pub fn run(&mut self, source: &str) -> Result<()> {
        info!("Running {} bytes of source", source.len());

        let (tokens, lex_errors) = Scanner::new(source).scan_tokens();

        for error in &lex_errors {
            self.report(error)?;
        }

        let statements = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                for error in &errors {
                    self.report(error)?;
                }
                return Ok(());
            }
        };

        if self.had_error {
            debug!("Skipping execution after syntax errors");
            return Ok(());
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Ok(()),
            Err(error @ LoxError::Runtime { .. }) => self.report_runtime(&error),
            Err(error) => Err(error),
        }
    }

    /// Scan only, reporting lexical errors.  Used by the `tokenize` command.
    pub fn tokenize(&mut self, source: &str) -> Result<Vec<Token>> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();

        for error in &errors {
            self.report(error)?;
        }

        Ok(tokens)
    }

    /// Syntax errors go to the diagnostics writer.
    fn report(&mut self, error: &LoxError) -> Result<()> {
        self.had_error = true;

        debug!("Reporting: {}", error);

        writeln!(self.diagnostics, "{}", error)?;
        self.diagnostics.flush()?;

        Ok(())
    }

    /// Runtime errors share the output writer with `print`, so they land
    /// after whatever the program printed before failing.
    fn report_runtime(&mut self, error: &LoxError) -> Result<()> {
        self.had_runtime_error = true;

        debug!("Reporting runtime error: {}", error);

        let out = self.interpreter.output_mut();
        writeln!(out, "{}", error)?;
        out.flush()?;

        Ok(())
    }

    /// A syntax error was reported since the last reset.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// A runtime error was reported since the last reset.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }

    pub fn diagnostics(&self) -> &E {
        &self.diagnostics
    }
}
