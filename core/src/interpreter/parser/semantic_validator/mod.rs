//! Semantic Validation for demo fragments
//!
//! An extensible rule-based validation system that runs after parsing to
//! catch mistakes the grammar can't express.
//!
//! # Usage
//!
//! ```ignore
//! use stagehand_core::interpreter::parser::{parse_fragment, semantic_validator::validate_script};
//!
//! let script = parse_fragment(source)?;
//! let errors = validate_script(&script, source, &known);
//! ```
//!
//! Fragments of one run share their bindings, so callers pass the names that
//! earlier fragments left behind in `known`.
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `semantic_validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use std::collections::BTreeSet;

use crate::interpreter::ast::Span;

use super::ScriptDef;

// ============================================================================
// Validation Error Types
// ============================================================================

/// A validation error produced by semantic analysis.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The source location of the issue
    pub span: Span,
    /// Human-readable message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

/// Severity levels for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Must be fixed - code is incorrect
    Error,
    /// Should probably be fixed - potential bug
    Warning,
}

impl ValidationError {
    pub fn error(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    pub fn warning(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    /// Check if this is an error (not a warning)
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at line {}, col {}: {} [{}]",
            severity,
            self.span.start_line + 1,
            self.span.start_col + 1,
            self.message,
            self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// What a rule sees besides the AST
pub struct ValidationContext<'a> {
    /// The fragment source
    pub source: &'a str,
    /// Names bound by earlier fragments of the same run
    pub known: &'a BTreeSet<String>,
}

/// Trait that all validation rules must implement.
///
/// Each rule checks one specific aspect of the code and must not depend on
/// other rules' results.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "undefined-variable")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation. An empty vector means no issues found.
    fn validate(&self, script: &ScriptDef, ctx: &ValidationContext<'_>) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                // Error rules
                Box::new(rules::UndefinedVariableRule),
                // Warning rules
                Box::new(rules::UnusedVariableRule),
            ],
        }
    }

    /// Run all validation rules and collect errors, ordered by position.
    pub fn validate(&self, script: &ScriptDef, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(script, ctx))
            .collect();
        errors.sort_by_key(|e| (e.span.start_line, e.span.start_col));
        errors
    }

    /// Registered rules as `(id, description)` pairs
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a fragment and return all errors found.
pub fn validate_script(
    script: &ScriptDef,
    source: &str,
    known: &BTreeSet<String>,
) -> Vec<ValidationError> {
    let ctx = ValidationContext { source, known };
    Validator::new().validate(script, &ctx)
}

/// Check if a fragment has any validation errors (not just warnings).
pub fn has_errors(script: &ScriptDef, source: &str, known: &BTreeSet<String>) -> bool {
    validate_script(script, source, known)
        .iter()
        .any(|e| e.is_error())
}

#[cfg(test)]
mod tests;
