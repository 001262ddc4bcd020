//! Rule: Undefined Variable
//!
//! Reports an error when a name is read before anything binds it.
//!
//! # Examples
//!
//! ```text
//! // Error: 'x' is used before it is bound
//! let y = x + 1
//! let x = 5
//! ```
//!
//! Names bound by the player (`demo`, `c`, `p`, ...) and names left behind
//! by earlier fragments are always in scope.

use std::collections::HashSet;

use crate::interpreter::ast::{Expr, MemberAccess, Stmt};
use crate::interpreter::parser::{bind_call_name, ScriptDef};
use crate::interpreter::STANDARD_BINDINGS;

use super::super::{ValidationContext, ValidationError, ValidationRule};

/// Rule that checks for undefined variable usage.
pub struct UndefinedVariableRule;

impl ValidationRule for UndefinedVariableRule {
    fn id(&self) -> &'static str {
        "undefined-variable"
    }

    fn description(&self) -> &'static str {
        "Variables must be bound before use"
    }

    fn validate(&self, script: &ScriptDef, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut scope = Scope::new();

        scope.add_builtins();
        for name in ctx.known {
            scope.define(name);
        }

        // The top level runs against the shared bindings, not a block scope
        for stmt in &script.body {
            check_stmt(stmt, &mut scope, &mut errors, self.id());
        }

        errors
    }
}

// ============================================================================
// Scope Tracking
// ============================================================================

struct Scope {
    defined: HashSet<String>,
}

impl Scope {
    fn new() -> Self {
        Self {
            defined: HashSet::new(),
        }
    }

    fn define(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    fn add_builtins(&mut self) {
        for name in STANDARD_BINDINGS {
            self.define(name);
        }
    }

    /// Create a child scope (for blocks and loops)
    fn child(&self) -> Self {
        Self {
            defined: self.defined.clone(),
        }
    }
}

// ============================================================================
// AST Traversal
// ============================================================================

fn check_stmt(stmt: &Stmt, scope: &mut Scope, errors: &mut Vec<ValidationError>, rule_id: &'static str) {
    match stmt {
        Stmt::Let { name, init, .. } => {
            // Initializer first, so `let x = x + 1` is caught
            if let Some(init_expr) = init {
                check_expr(init_expr, scope, errors, rule_id);
            }
            scope.define(name);
        }

        Stmt::Assign {
            var,
            var_span,
            path,
            value,
            ..
        } => {
            for access in path {
                if let MemberAccess::Index { expr, .. } = access {
                    check_expr(expr, scope, errors, rule_id);
                }
            }
            check_expr(value, scope, errors, rule_id);
            if path.is_empty() {
                // Plain assignment creates the binding
                scope.define(var);
            } else if !scope.is_defined(var) {
                errors.push(ValidationError::error(
                    *var_span,
                    format!("Undefined variable '{}'", var),
                    rule_id,
                ));
            }
        }

        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            check_expr(test, scope, errors, rule_id);

            let mut then_scope = scope.child();
            check_stmt(then_s, &mut then_scope, errors, rule_id);

            if let Some(else_stmt) = else_s {
                let mut else_scope = scope.child();
                check_stmt(else_stmt, &mut else_scope, errors, rule_id);
            }
        }

        Stmt::ForOf {
            binding,
            iterable,
            body,
            ..
        } => {
            check_expr(iterable, scope, errors, rule_id);

            let mut body_scope = scope.child();
            body_scope.define(binding);
            check_stmt(body, &mut body_scope, errors, rule_id);
        }

        Stmt::Block { body, .. } => {
            let mut block_scope = scope.child();
            for stmt in body {
                check_stmt(stmt, &mut block_scope, errors, rule_id);
            }
        }

        Stmt::Expr { expr, .. } => {
            check_expr(expr, scope, errors, rule_id);
            if let Some(name) = bind_call_name(expr) {
                scope.define(name);
            }
        }
    }
}

fn check_expr(expr: &Expr, scope: &Scope, errors: &mut Vec<ValidationError>, rule_id: &'static str) {
    match expr {
        Expr::Ident { name, span } => {
            if !scope.is_defined(name) {
                errors.push(ValidationError::error(
                    *span,
                    format!("Undefined variable '{}'", name),
                    rule_id,
                ));
            }
        }

        Expr::Member { object, .. } => {
            // Only check the object, not the property
            check_expr(object, scope, errors, rule_id);
        }

        Expr::Index { object, index, .. } => {
            check_expr(object, scope, errors, rule_id);
            check_expr(index, scope, errors, rule_id);
        }

        Expr::Call { callee, args, .. } => {
            check_expr(callee, scope, errors, rule_id);
            for arg in args {
                check_expr(arg, scope, errors, rule_id);
            }
        }

        Expr::Unary { operand, .. } => {
            check_expr(operand, scope, errors, rule_id);
        }

        Expr::Binary { left, right, .. } => {
            check_expr(left, scope, errors, rule_id);
            check_expr(right, scope, errors, rule_id);
        }

        Expr::LitList { elements, .. } => {
            for element in elements {
                check_expr(element, scope, errors, rule_id);
            }
        }

        Expr::LitObj { properties, .. } => {
            for (_, _, value) in properties {
                check_expr(value, scope, errors, rule_id);
            }
        }

        Expr::LitBool { .. } | Expr::LitNum { .. } | Expr::LitStr { .. } | Expr::LitNull { .. } => {}
    }
}
