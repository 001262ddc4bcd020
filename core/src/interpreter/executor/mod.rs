//! Tree-walking executor
//!
//! Plain values (numbers, strings, lists, objects) are handled here. Anything
//! that reaches into the outside world (nodes, widgets, `demo`, constructors)
//! goes through the [`Runtime`] trait, which the player implements.

mod expressions;
mod statements;

#[cfg(test)]
mod tests;

use super::env::Env;
use super::errors::{ScriptError, ScriptResult};
use super::parser::{parse_fragment, ScriptDef};
use super::values::{NativeFn, Val};

pub use expressions::eval_expr;
pub use statements::exec_stmt;

/// Operations on values the executor can't interpret itself
pub trait Runtime {
    /// Call a built-in function
    fn call_native(&mut self, env: &mut Env, func: NativeFn, args: Vec<Val>) -> ScriptResult<Val>;

    /// Call `target.method(args)` on a node, widget or host object
    fn call_method(
        &mut self,
        env: &mut Env,
        target: &Val,
        method: &str,
        args: Vec<Val>,
    ) -> ScriptResult<Val>;

    /// Read `target.property` on a node, widget or host object
    fn get_property(&mut self, target: &Val, property: &str) -> ScriptResult<Val>;

    /// Write `target.property = value` on a node, widget or host object
    fn set_property(&mut self, target: &Val, property: &str, value: Val) -> ScriptResult<()>;
}

/// Execute a parsed fragment against `env`
///
/// Top-level statements run directly against the shared bindings.
pub fn execute(script: &ScriptDef, env: &mut Env, runtime: &mut dyn Runtime) -> ScriptResult<()> {
    for stmt in &script.body {
        exec_stmt(stmt, env, runtime)?;
    }
    Ok(())
}

/// Parse and execute fragment source
pub fn run_source(source: &str, env: &mut Env, runtime: &mut dyn Runtime) -> ScriptResult<()> {
    let script = parse_fragment(source).map_err(ScriptError::from)?;
    execute(&script, env, runtime)
}

/// Runtime with no outside world: `print` collects into `output`, every host
/// value access fails.
#[derive(Debug, Default)]
pub struct PureRuntime {
    pub output: Vec<String>,
}

impl Runtime for PureRuntime {
    fn call_native(&mut self, _env: &mut Env, func: NativeFn, args: Vec<Val>) -> ScriptResult<Val> {
        match func {
            NativeFn::Print => {
                self.output.push(join_display(&args));
                Ok(Val::Null)
            }
            other => Err(ScriptError::host(format!(
                "{} is not available here",
                other.name()
            ))),
        }
    }

    fn call_method(
        &mut self,
        _env: &mut Env,
        target: &Val,
        method: &str,
        _args: Vec<Val>,
    ) -> ScriptResult<Val> {
        Err(ScriptError::host(format!(
            "cannot call '{}' on {}",
            method,
            target.type_name()
        )))
    }

    fn get_property(&mut self, target: &Val, property: &str) -> ScriptResult<Val> {
        Err(ScriptError::host(format!(
            "cannot read '{}' of {}",
            property,
            target.type_name()
        )))
    }

    fn set_property(&mut self, target: &Val, property: &str, _value: Val) -> ScriptResult<()> {
        Err(ScriptError::host(format!(
            "cannot set '{}' on {}",
            property,
            target.type_name()
        )))
    }
}

/// `print` formatting: display strings joined by single spaces
pub fn join_display(args: &[Val]) -> String {
    args.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
