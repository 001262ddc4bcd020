//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `undefined_variable.rs` - Variables used before they are bound
//! - `unused_variable.rs` - Block-scoped variables never read

mod undefined_variable;
mod unused_variable;

pub use undefined_variable::UndefinedVariableRule;
pub use unused_variable::UnusedVariableRule;
