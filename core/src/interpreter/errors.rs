//! Script error codes
//!
//! Every failure raised while parsing or evaluating a fragment carries one of
//! these codes so callers can match on the kind without parsing messages.

use thiserror::Error;

use super::ast::Span;
use super::parser::ParseError;

pub const UNDEFINED_VARIABLE: &str = "UNDEFINED_VARIABLE";
pub const TYPE_ERROR: &str = "TYPE_ERROR";
pub const PROPERTY_NOT_FOUND: &str = "PROPERTY_NOT_FOUND";
pub const NOT_CALLABLE: &str = "NOT_CALLABLE";
pub const ARGUMENT_ERROR: &str = "ARGUMENT_ERROR";
pub const HOST_ERROR: &str = "HOST_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";

pub type ScriptResult<T> = Result<T, ScriptError>;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ScriptError {
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl ScriptError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a location unless a more precise one is already set
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(UNDEFINED_VARIABLE, format!("Variable '{}' is not defined", name))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(TYPE_ERROR, message)
    }

    pub fn property_not_found(property: &str) -> Self {
        Self::new(PROPERTY_NOT_FOUND, format!("Property '{}' not found", property))
    }

    pub fn not_callable(what: &str) -> Self {
        Self::new(NOT_CALLABLE, format!("'{}' is not a function", what))
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ARGUMENT_ERROR, message)
    }

    pub fn host(message: impl Into<String>) -> Self {
        Self::new(HOST_ERROR, message)
    }

    /// 1-based line of the error, when known
    pub fn line(&self) -> Option<usize> {
        self.span.map(|s| s.start_line + 1)
    }
}

impl From<ParseError> for ScriptError {
    fn from(err: ParseError) -> Self {
        Self {
            code: PARSE_ERROR,
            message: err.message().to_string(),
            span: err.span(),
        }
    }
}
