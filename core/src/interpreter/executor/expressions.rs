//! Expression evaluation

use std::collections::HashMap;

use crate::interpreter::ast::{BinaryOp, Expr, UnaryOp};
use crate::interpreter::env::Env;
use crate::interpreter::errors::{ScriptError, ScriptResult};
use crate::interpreter::values::Val;

use super::Runtime;

/// Evaluate an expression to a value
///
/// Errors raised below this node are tagged with its span unless a deeper
/// node already tagged them.
pub fn eval_expr(expr: &Expr, env: &mut Env, rt: &mut dyn Runtime) -> ScriptResult<Val> {
    eval_inner(expr, env, rt).map_err(|e| e.at(expr.span()))
}

fn eval_inner(expr: &Expr, env: &mut Env, rt: &mut dyn Runtime) -> ScriptResult<Val> {
    match expr {
        Expr::LitBool { v, .. } => Ok(Val::Bool(*v)),
        Expr::LitNum { v, .. } => Ok(Val::Num(*v)),
        Expr::LitStr { v, .. } => Ok(Val::Str(v.clone())),
        Expr::LitNull { .. } => Ok(Val::Null),

        Expr::LitList { elements, .. } => {
            let items = elements
                .iter()
                .map(|e| eval_expr(e, env, rt))
                .collect::<ScriptResult<Vec<_>>>()?;
            Ok(Val::List(items))
        }

        Expr::LitObj { properties, .. } => {
            let mut map = HashMap::with_capacity(properties.len());
            for (key, _, value) in properties {
                map.insert(key.clone(), eval_expr(value, env, rt)?);
            }
            Ok(Val::Obj(map))
        }

        Expr::Ident { name, .. } => env
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::undefined_variable(name)),

        Expr::Member {
            object, property, ..
        } => {
            let target = eval_expr(object, env, rt)?;
            get_member(&target, property, rt)
        }

        Expr::Index { object, index, .. } => {
            let target = eval_expr(object, env, rt)?;
            let index = eval_expr(index, env, rt)?;
            get_index(&target, &index, rt)
        }

        Expr::Call { callee, args, .. } => eval_call(callee, args, env, rt),

        Expr::Unary { op, operand, .. } => {
            let value = eval_expr(operand, env, rt)?;
            match (op, value) {
                (UnaryOp::Not, value) => Ok(Val::Bool(!value.is_truthy())),
                (UnaryOp::Neg, Val::Num(n)) => Ok(Val::Num(-n)),
                (UnaryOp::Neg, other) => Err(ScriptError::type_error(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            }
        }

        Expr::Binary {
            op, left, right, ..
        } => {
            // Short-circuit operators yield an operand, not a boolean
            match op {
                BinaryOp::And => {
                    let lhs = eval_expr(left, env, rt)?;
                    if !lhs.is_truthy() {
                        return Ok(lhs);
                    }
                    eval_expr(right, env, rt)
                }
                BinaryOp::Or => {
                    let lhs = eval_expr(left, env, rt)?;
                    if lhs.is_truthy() {
                        return Ok(lhs);
                    }
                    eval_expr(right, env, rt)
                }
                _ => {
                    let lhs = eval_expr(left, env, rt)?;
                    let rhs = eval_expr(right, env, rt)?;
                    binary_op(*op, lhs, rhs)
                }
            }
        }
    }
}

fn eval_call(callee: &Expr, args: &[Expr], env: &mut Env, rt: &mut dyn Runtime) -> ScriptResult<Val> {
    // Method call: evaluate the receiver once and dispatch on it
    if let Expr::Member {
        object, property, ..
    } = callee
    {
        let target = eval_expr(object, env, rt)?;
        let args = eval_args(args, env, rt)?;
        if is_host_value(&target) {
            return rt.call_method(env, &target, property, args);
        }
        return match get_member(&target, property, rt)? {
            Val::Native(func) => rt.call_native(env, func, args),
            _ => Err(ScriptError::not_callable(property)),
        };
    }

    let func = eval_expr(callee, env, rt)?;
    let args = eval_args(args, env, rt)?;
    match func {
        Val::Native(func) => rt.call_native(env, func, args),
        other => Err(ScriptError::not_callable(&other.to_string())),
    }
}

fn eval_args(args: &[Expr], env: &mut Env, rt: &mut dyn Runtime) -> ScriptResult<Vec<Val>> {
    args.iter().map(|a| eval_expr(a, env, rt)).collect()
}

/// Values whose members live outside the interpreter
pub(super) fn is_host_value(value: &Val) -> bool {
    matches!(value, Val::Node(_) | Val::Widget(_) | Val::Host(_))
}

/// Read `target.property`
pub(super) fn get_member(target: &Val, property: &str, rt: &mut dyn Runtime) -> ScriptResult<Val> {
    match target {
        Val::Obj(map) => map
            .get(property)
            .cloned()
            .ok_or_else(|| ScriptError::property_not_found(property)),
        Val::List(items) if property == "length" => Ok(Val::Num(items.len() as f64)),
        Val::Str(s) if property == "length" => Ok(Val::Num(s.chars().count() as f64)),
        v if is_host_value(v) => rt.get_property(v, property),
        other => Err(ScriptError::type_error(format!(
            "cannot read property '{}' of {}",
            property,
            other.type_name()
        ))),
    }
}

fn get_index(target: &Val, index: &Val, rt: &mut dyn Runtime) -> ScriptResult<Val> {
    match (target, index) {
        (Val::List(items), Val::Num(n)) => Ok(index_of(*n)
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Val::Null)),
        (Val::Str(s), Val::Num(n)) => Ok(index_of(*n)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Val::Str(c.to_string()))
            .unwrap_or(Val::Null)),
        (_, Val::Str(key)) => get_member(target, key, rt),
        (target, index) => Err(ScriptError::type_error(format!(
            "cannot index {} with {}",
            target.type_name(),
            index.type_name()
        ))),
    }
}

fn index_of(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

fn binary_op(op: BinaryOp, lhs: Val, rhs: Val) -> ScriptResult<Val> {
    match (op, lhs, rhs) {
        (BinaryOp::Eq, l, r) => Ok(Val::Bool(l == r)),
        (BinaryOp::Ne, l, r) => Ok(Val::Bool(l != r)),

        (BinaryOp::Add, Val::Num(l), Val::Num(r)) => Ok(Val::Num(l + r)),
        (BinaryOp::Add, Val::List(mut l), Val::List(r)) => {
            l.extend(r);
            Ok(Val::List(l))
        }
        (BinaryOp::Add, l @ Val::Str(_), r) | (BinaryOp::Add, l, r @ Val::Str(_)) => {
            Ok(Val::Str(format!("{}{}", l, r)))
        }

        (BinaryOp::Sub, Val::Num(l), Val::Num(r)) => Ok(Val::Num(l - r)),
        (BinaryOp::Mul, Val::Num(l), Val::Num(r)) => Ok(Val::Num(l * r)),
        (BinaryOp::Div | BinaryOp::Mod, Val::Num(_), Val::Num(r)) if r == 0.0 => {
            Err(ScriptError::type_error("division by zero"))
        }
        (BinaryOp::Div, Val::Num(l), Val::Num(r)) => Ok(Val::Num(l / r)),
        (BinaryOp::Mod, Val::Num(l), Val::Num(r)) => Ok(Val::Num(l % r)),

        (BinaryOp::Lt, Val::Num(l), Val::Num(r)) => Ok(Val::Bool(l < r)),
        (BinaryOp::Lte, Val::Num(l), Val::Num(r)) => Ok(Val::Bool(l <= r)),
        (BinaryOp::Gt, Val::Num(l), Val::Num(r)) => Ok(Val::Bool(l > r)),
        (BinaryOp::Gte, Val::Num(l), Val::Num(r)) => Ok(Val::Bool(l >= r)),
        (BinaryOp::Lt, Val::Str(l), Val::Str(r)) => Ok(Val::Bool(l < r)),
        (BinaryOp::Lte, Val::Str(l), Val::Str(r)) => Ok(Val::Bool(l <= r)),
        (BinaryOp::Gt, Val::Str(l), Val::Str(r)) => Ok(Val::Bool(l > r)),
        (BinaryOp::Gte, Val::Str(l), Val::Str(r)) => Ok(Val::Bool(l >= r)),

        (op, l, r) => Err(ScriptError::type_error(format!(
            "unsupported operands for '{}': {} and {}",
            op.symbol(),
            l.type_name(),
            r.type_name()
        ))),
    }
}
