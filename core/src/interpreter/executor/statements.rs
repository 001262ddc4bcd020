//! Statement execution

use crate::interpreter::ast::{MemberAccess, Stmt};
use crate::interpreter::env::Env;
use crate::interpreter::errors::{ScriptError, ScriptResult};
use crate::interpreter::values::Val;

use super::expressions::{eval_expr, is_host_value};
use super::Runtime;

/// Resolved assignment path segment
enum Key {
    Prop(String),
    Index(Val),
}

pub fn exec_stmt(stmt: &Stmt, env: &mut Env, rt: &mut dyn Runtime) -> ScriptResult<()> {
    match stmt {
        Stmt::Block { body, .. } => {
            env.push_scope();
            let result = body.iter().try_for_each(|s| exec_stmt(s, env, rt));
            env.pop_scope();
            result
        }

        Stmt::Let { name, init, .. } => {
            let value = match init {
                Some(expr) => eval_expr(expr, env, rt)?,
                None => Val::Null,
            };
            env.declare(name.clone(), value);
            Ok(())
        }

        Stmt::Assign {
            var,
            var_span,
            path,
            value,
            span,
        } => {
            if path.is_empty() {
                let value = eval_expr(value, env, rt)?;
                env.assign(var, value);
                return Ok(());
            }

            let mut keys = Vec::with_capacity(path.len());
            for access in path {
                keys.push(match access {
                    MemberAccess::Prop { property, .. } => Key::Prop(property.clone()),
                    MemberAccess::Index { expr, .. } => Key::Index(eval_expr(expr, env, rt)?),
                });
            }
            let value = eval_expr(value, env, rt)?;

            let root = env
                .get_mut(var)
                .ok_or_else(|| ScriptError::undefined_variable(var).at(*var_span))?;
            assign_path(root, &keys, value, rt).map_err(|e| e.at(*span))
        }

        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            if eval_expr(test, env, rt)?.is_truthy() {
                exec_stmt(then_s, env, rt)
            } else if let Some(else_s) = else_s {
                exec_stmt(else_s, env, rt)
            } else {
                Ok(())
            }
        }

        Stmt::ForOf {
            binding,
            iterable,
            body,
            span,
            ..
        } => {
            let items = match eval_expr(iterable, env, rt)? {
                Val::List(items) => items,
                Val::Str(s) => s.chars().map(|c| Val::Str(c.to_string())).collect(),
                other => {
                    return Err(ScriptError::type_error(format!(
                        "{} is not iterable",
                        other.type_name()
                    ))
                    .at(*span))
                }
            };

            env.push_scope();
            let result = items.into_iter().try_for_each(|item| {
                env.declare(binding.clone(), item);
                exec_stmt(body, env, rt)
            });
            env.pop_scope();
            result
        }

        Stmt::Expr { expr, .. } => {
            eval_expr(expr, env, rt)?;
            Ok(())
        }
    }
}

/// Write `value` at `keys` below `target`
///
/// Host handles (nodes, widgets, host objects) are references, so writing
/// through a copy of one reaches the real thing via the runtime.
fn assign_path(target: &mut Val, keys: &[Key], value: Val, rt: &mut dyn Runtime) -> ScriptResult<()> {
    let Some((key, rest)) = keys.split_first() else {
        *target = value;
        return Ok(());
    };

    if is_host_value(target) {
        let Key::Prop(prop) = key else {
            return Err(ScriptError::type_error(format!(
                "cannot index into {}",
                target.type_name()
            )));
        };
        if rest.is_empty() {
            return rt.set_property(target, prop, value);
        }
        let mut child = rt.get_property(target, prop)?;
        return assign_path(&mut child, rest, value, rt);
    }

    match (target, key) {
        (Val::Obj(map), Key::Prop(prop)) | (Val::Obj(map), Key::Index(Val::Str(prop))) => {
            if rest.is_empty() {
                map.insert(prop.clone(), value);
                return Ok(());
            }
            let child = map
                .get_mut(prop.as_str())
                .ok_or_else(|| ScriptError::property_not_found(prop))?;
            assign_path(child, rest, value, rt)
        }
        (Val::List(items), Key::Index(Val::Num(n))) => {
            let len = items.len();
            let index = list_index(*n, len)?;
            if index == len && rest.is_empty() {
                items.push(value);
                return Ok(());
            }
            let child = items.get_mut(index).ok_or_else(|| {
                ScriptError::argument(format!("index {} out of range for list of {}", n, len))
            })?;
            assign_path(child, rest, value, rt)
        }
        (other, Key::Prop(prop)) => Err(ScriptError::type_error(format!(
            "cannot set property '{}' on {}",
            prop,
            other.type_name()
        ))),
        (other, Key::Index(index)) => Err(ScriptError::type_error(format!(
            "cannot assign index {} of {}",
            index,
            other.type_name()
        ))),
    }
}

fn list_index(n: f64, len: usize) -> ScriptResult<usize> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(ScriptError::argument(format!("invalid list index {}", n)));
    }
    let index = n as usize;
    if index > len {
        return Err(ScriptError::argument(format!(
            "index {} out of range for list of {}",
            index, len
        )));
    }
    Ok(index)
}
