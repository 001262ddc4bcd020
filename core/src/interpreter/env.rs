//! Variable bindings
//!
//! Globals outlive a single fragment: they are the bindings shared by every
//! step of a run. Block scopes are pushed while a fragment executes and are
//! always empty again once it returns.

use std::collections::HashMap;

use super::values::Val;

#[derive(Debug, Clone, Default)]
pub struct Env {
    globals: HashMap<String, Val>,
    scopes: Vec<HashMap<String, Val>>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_globals(globals: HashMap<String, Val>) -> Self {
        Self {
            globals,
            scopes: Vec::new(),
        }
    }

    /// Look a name up from the innermost scope outwards
    pub fn get(&self, name: &str) -> Option<&Val> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Val> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(val) = scope.get_mut(name) {
                return Some(val);
            }
        }
        self.globals.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `let`: bind in the innermost scope (a global at top level)
    pub fn declare(&mut self, name: impl Into<String>, value: Val) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.into(), value),
            None => self.globals.insert(name.into(), value),
        };
    }

    /// Plain assignment: update the nearest binding, else create a global
    pub fn assign(&mut self, name: &str, value: Val) {
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Val) -> Option<Val> {
        self.globals.insert(name.into(), value)
    }

    pub fn global(&self, name: &str) -> Option<&Val> {
        self.globals.get(name)
    }

    pub fn globals(&self) -> &HashMap<String, Val> {
        &self.globals
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
