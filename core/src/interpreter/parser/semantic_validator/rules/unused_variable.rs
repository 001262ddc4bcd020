//! Rule: Unused Variable
//!
//! Reports a warning when a block-scoped variable is declared but never read.
//!
//! # Examples
//!
//! ```text
//! if (ready) {
//!     let w = Label("hi")   // Warning: 'w' is declared but never used
//! }
//! ```
//!
//! # Notes
//!
//! - Top-level `let`s are exempt: they persist into later fragments
//! - Variables starting with `_` are exempt (convention for intentionally unused)

use std::collections::HashSet;

use crate::interpreter::ast::{Expr, MemberAccess, Span, Stmt};
use crate::interpreter::parser::ScriptDef;

use super::super::{ValidationContext, ValidationError, ValidationRule};

/// Rule that checks for unused block-scoped declarations.
pub struct UnusedVariableRule;

impl ValidationRule for UnusedVariableRule {
    fn id(&self) -> &'static str {
        "unused-variable"
    }

    fn description(&self) -> &'static str {
        "Block-scoped variables should be used after declaration"
    }

    fn validate(&self, script: &ScriptDef, _ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        // Phase 1: Collect block-scoped declarations
        let mut declarations: Vec<(String, Span)> = Vec::new();
        for stmt in &script.body {
            collect_nested_declarations(stmt, false, &mut declarations);
        }

        // Phase 2: Collect all usages
        let mut usages: HashSet<String> = HashSet::new();
        for stmt in &script.body {
            collect_usages(stmt, &mut usages);
        }

        // Phase 3: Report unused declarations
        declarations
            .into_iter()
            .filter(|(name, _)| !name.starts_with('_') && !usages.contains(name))
            .map(|(name, span)| {
                ValidationError::warning(
                    span,
                    format!("Variable '{}' is declared but never used", name),
                    self.id(),
                )
            })
            .collect()
    }
}

// ============================================================================
// Declaration Collection
// ============================================================================

fn collect_nested_declarations(stmt: &Stmt, nested: bool, declarations: &mut Vec<(String, Span)>) {
    match stmt {
        Stmt::Let { name, name_span, .. } => {
            if nested {
                declarations.push((name.clone(), *name_span));
            }
        }

        Stmt::ForOf {
            binding,
            binding_span,
            body,
            ..
        } => {
            declarations.push((binding.clone(), *binding_span));
            collect_nested_declarations(body, true, declarations);
        }

        Stmt::Block { body, .. } => {
            for s in body {
                collect_nested_declarations(s, true, declarations);
            }
        }

        Stmt::If { then_s, else_s, .. } => {
            collect_nested_declarations(then_s, true, declarations);
            if let Some(else_stmt) = else_s {
                collect_nested_declarations(else_stmt, true, declarations);
            }
        }

        Stmt::Assign { .. } | Stmt::Expr { .. } => {}
    }
}

// ============================================================================
// Usage Collection
// ============================================================================

fn collect_usages(stmt: &Stmt, usages: &mut HashSet<String>) {
    match stmt {
        Stmt::Let { init, .. } => {
            if let Some(expr) = init {
                collect_expr_usages(expr, usages);
            }
        }

        Stmt::Assign {
            var, path, value, ..
        } => {
            // `x.y = v` reads x
            if !path.is_empty() {
                usages.insert(var.clone());
            }
            for access in path {
                if let MemberAccess::Index { expr, .. } = access {
                    collect_expr_usages(expr, usages);
                }
            }
            collect_expr_usages(value, usages);
        }

        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            collect_expr_usages(test, usages);
            collect_usages(then_s, usages);
            if let Some(else_stmt) = else_s {
                collect_usages(else_stmt, usages);
            }
        }

        Stmt::ForOf { iterable, body, .. } => {
            collect_expr_usages(iterable, usages);
            collect_usages(body, usages);
        }

        Stmt::Block { body, .. } => {
            for s in body {
                collect_usages(s, usages);
            }
        }

        Stmt::Expr { expr, .. } => collect_expr_usages(expr, usages),
    }
}

fn collect_expr_usages(expr: &Expr, usages: &mut HashSet<String>) {
    match expr {
        Expr::Ident { name, .. } => {
            usages.insert(name.clone());
        }
        Expr::Member { object, .. } => collect_expr_usages(object, usages),
        Expr::Index { object, index, .. } => {
            collect_expr_usages(object, usages);
            collect_expr_usages(index, usages);
        }
        Expr::Call { callee, args, .. } => {
            collect_expr_usages(callee, usages);
            for arg in args {
                collect_expr_usages(arg, usages);
            }
        }
        Expr::Unary { operand, .. } => collect_expr_usages(operand, usages),
        Expr::Binary { left, right, .. } => {
            collect_expr_usages(left, usages);
            collect_expr_usages(right, usages);
        }
        Expr::LitList { elements, .. } => {
            for element in elements {
                collect_expr_usages(element, usages);
            }
        }
        Expr::LitObj { properties, .. } => {
            for (_, _, value) in properties {
                collect_expr_usages(value, usages);
            }
        }
        Expr::LitBool { .. } | Expr::LitNum { .. } | Expr::LitStr { .. } | Expr::LitNull { .. } => {}
    }
}
