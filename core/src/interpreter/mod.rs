//! Fragment scripting language
//!
//! A small expression language for demo fragments: a pest grammar, a
//! span-annotated AST, a rule-based semantic validator and a tree-walking
//! executor. The executor only knows plain values; everything that touches
//! the outline or the screen goes through [`executor::Runtime`].

pub mod ast;
pub mod env;
pub mod errors;
pub mod executor;
pub mod parser;
pub mod values;

pub use env::Env;
pub use errors::{ScriptError, ScriptResult};
pub use executor::{execute, run_source, PureRuntime, Runtime};
pub use parser::semantic_validator::{has_errors, validate_script, Severity, ValidationError};
pub use parser::{parse_expression, parse_fragment, ParseError, ScriptDef};
pub use values::{HostObject, NativeFn, Val};

/// Names bound into every run before the first fragment executes
pub const STANDARD_BINDINGS: &[&str] = &[
    "demo", "c", "p", "user", "print", "Label", "Callout", "Title", "Image", "Text",
];
