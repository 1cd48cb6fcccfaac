//! Scope chain stored as an arena of records addressed by [`ScopeId`].
//!
//! Each record holds its own bindings and the id of its enclosing scope.  A
//! child never owns its parent, so a function value can name the scope it was
//! declared in without creating an ownership cycle.
//!
//! Function calls always enclose the global scope, so scopes are created and
//! released in strict stack order: [`Environment::push`] on block/call entry,
//! [`Environment::pop`] on exit.

use std::collections::HashMap;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Handle to one scope record in an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// The outermost scope, which always exists.
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    /// Open a new, empty scope enclosed by `enclosing`.
    pub fn push(&mut self, enclosing: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());

        self.scopes.push(Scope {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        });

        debug!("Pushed scope {:?} enclosed by {:?}", id, enclosing);

        id
    }

    /// Release `scope` and everything opened after it.  The global scope is
    /// never released.
    pub fn pop(&mut self, scope: ScopeId) {
        let keep = scope.0.max(1);

        debug!("Popping scopes from {:?} ({} live)", scope, self.scopes.len());

        self.scopes.truncate(keep);
    }

    /// Number of live scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in `scope` itself, shadowing or overwriting as needed.
    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value) {
        debug!("define '{}' in {:?}", name, scope);

        if let Some(record) = self.scopes.get_mut(scope.0) {
            record.values.insert(name.to_string(), value);
        }
    }

    /// Look `name` up from `scope` outwards.
    pub fn get(&self, scope: ScopeId, name: &Token) -> Result<Value> {
        let mut cursor: Option<ScopeId> = Some(scope);

        while let Some(id) = cursor {
            let Some(record) = self.scopes.get(id.0) else {
                break;
            };

            if let Some(value) = record.values.get(&name.lexeme) {
                return Ok(value.clone());
            }

            cursor = record.enclosing;
        }

        Err(undefined(name))
    }

    /// Overwrite the nearest existing binding of `name`.  Never creates one.
    pub fn assign(&mut self, scope: ScopeId, name: &Token, value: Value) -> Result<()> {
        let mut cursor: Option<ScopeId> = Some(scope);

        while let Some(id) = cursor {
            let Some(record) = self.scopes.get_mut(id.0) else {
                break;
            };

            if let Some(slot) = record.values.get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }

            cursor = record.enclosing;
        }

        Err(undefined(name))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
