//! Executor tests
//!
//! Plain-value semantics run against `PureRuntime`; host dispatch runs against
//! a small fake runtime that stores node text in maps.

use std::collections::HashMap;

use maplit::hashmap;

use super::{run_source, PureRuntime, Runtime};
use crate::interpreter::env::Env;
use crate::interpreter::errors::{self, ScriptError, ScriptResult};
use crate::interpreter::values::{HostObject, NativeFn, Val};
use crate::outline::NodeId;

/* ===================== Helpers ===================== */

fn run(source: &str) -> (Env, PureRuntime) {
    let mut env = Env::new();
    let mut rt = PureRuntime::default();
    run_source(source, &mut env, &mut rt).expect("script should run");
    (env, rt)
}

fn run_err(source: &str) -> ScriptError {
    let mut env = Env::new();
    let mut rt = PureRuntime::default();
    run_source(source, &mut env, &mut rt).expect_err("script should fail")
}

fn global(env: &Env, name: &str) -> Val {
    env.get(name).cloned().unwrap_or_else(|| panic!("{} not bound", name))
}

/// Nodes with a writable `h`, plus a `demo.echo(x)` method
#[derive(Default)]
struct FakeRuntime {
    headlines: HashMap<NodeId, String>,
    calls: Vec<String>,
}

impl Runtime for FakeRuntime {
    fn call_native(&mut self, _env: &mut Env, func: NativeFn, args: Vec<Val>) -> ScriptResult<Val> {
        self.calls.push(format!("{}({})", func.name(), args.len()));
        Ok(Val::Null)
    }

    fn call_method(&mut self, env: &mut Env, target: &Val, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        match (target, method) {
            (Val::Host(HostObject::Demo), "echo") => Ok(args.into_iter().next().unwrap_or(Val::Null)),
            (Val::Host(HostObject::Demo), "bind") => {
                let name = args[0].as_str().unwrap_or_default().to_string();
                env.set_global(name, args[1].clone());
                Ok(Val::Null)
            }
            _ => Err(ScriptError::property_not_found(method)),
        }
    }

    fn get_property(&mut self, target: &Val, property: &str) -> ScriptResult<Val> {
        match (target, property) {
            (Val::Node(id), "h") => Ok(Val::Str(self.headlines.get(id).cloned().unwrap_or_default())),
            (Val::Host(HostObject::Commander), "p") => Ok(Val::Node(NodeId(0))),
            _ => Err(ScriptError::property_not_found(property)),
        }
    }

    fn set_property(&mut self, target: &Val, property: &str, value: Val) -> ScriptResult<()> {
        match (target, property, value) {
            (Val::Node(id), "h", Val::Str(s)) => {
                self.headlines.insert(*id, s);
                Ok(())
            }
            _ => Err(ScriptError::type_error("read-only")),
        }
    }
}

fn host_env() -> Env {
    Env::with_globals(hashmap! {
        "demo".to_string() => Val::Host(HostObject::Demo),
        "c".to_string() => Val::Host(HostObject::Commander),
        "p".to_string() => Val::Node(NodeId(0)),
        "Label".to_string() => Val::Native(NativeFn::Label),
    })
}

/* ===================== Bindings ===================== */

#[test]
fn test_top_level_let_is_global() {
    let mut env = Env::new();
    let mut rt = PureRuntime::default();

    run_source("let x = 1", &mut env, &mut rt).unwrap();
    run_source("x = x + 1", &mut env, &mut rt).unwrap();

    assert_eq!(env.global("x"), Some(&Val::Num(2.0)));
    assert_eq!(env.depth(), 0);
}

#[test]
fn test_block_let_is_scoped() {
    let (env, _) = run("let x = 1\nif (true) {\n    let x = 2\n    y = x\n}");

    assert_eq!(global(&env, "x"), Val::Num(1.0));
    assert_eq!(global(&env, "y"), Val::Num(2.0));
}

#[test]
fn test_assignment_updates_nearest_binding() {
    let (env, _) = run("let total = 0\nfor (let n of [1, 2, 3]) {\n    total = total + n\n}");
    assert_eq!(global(&env, "total"), Val::Num(6.0));
    assert!(env.get("n").is_none());
}

#[test]
fn test_undefined_variable() {
    let err = run_err("let y = missing");
    assert_eq!(err.code, errors::UNDEFINED_VARIABLE);
    assert!(err.message.contains("'missing'"));
    assert_eq!(err.line(), Some(1));
}

/* ===================== Operators ===================== */

#[test]
fn test_arithmetic_and_precedence() {
    let (env, _) = run("let a = 1 + 2 * 3\nlet b = (1 + 2) * 3\nlet c = 7 % 4 - -1");
    assert_eq!(global(&env, "a"), Val::Num(7.0));
    assert_eq!(global(&env, "b"), Val::Num(9.0));
    assert_eq!(global(&env, "c"), Val::Num(4.0));
}

#[test]
fn test_string_concatenation() {
    let (env, _) = run("let s = 'step ' + 2 + '!'");
    assert_eq!(global(&env, "s"), Val::Str("step 2!".to_string()));
}

#[test]
fn test_comparisons_and_equality() {
    let (env, _) = run("let a = 1 < 2\nlet b = 'a' >= 'b'\nlet c = [1, 2] == [1, 2]\nlet d = null != false");
    assert_eq!(global(&env, "a"), Val::Bool(true));
    assert_eq!(global(&env, "b"), Val::Bool(false));
    assert_eq!(global(&env, "c"), Val::Bool(true));
    assert_eq!(global(&env, "d"), Val::Bool(true));
}

#[test]
fn test_logical_operators_short_circuit() {
    // The right side would fail if evaluated
    let (env, _) = run("let a = false && missing\nlet b = 'x' || missing\nlet c = null || 5");
    assert_eq!(global(&env, "a"), Val::Bool(false));
    assert_eq!(global(&env, "b"), Val::Str("x".to_string()));
    assert_eq!(global(&env, "c"), Val::Num(5.0));
}

#[test]
fn test_type_errors() {
    assert_eq!(run_err("let x = 1 - 'a'").code, errors::TYPE_ERROR);
    assert_eq!(run_err("let x = -'a'").code, errors::TYPE_ERROR);
    assert_eq!(run_err("let x = 1 / 0").code, errors::TYPE_ERROR);
    assert_eq!(run_err("for (let x of 5) {}").code, errors::TYPE_ERROR);
}

/* ===================== Objects and Lists ===================== */

#[test]
fn test_object_member_and_nested_assignment() {
    let (env, _) = run("let o = {a: {b: 1}}\no.a.b = 2\no['c'] = 3\nlet v = o.a.b + o.c");
    assert_eq!(global(&env, "v"), Val::Num(5.0));
}

#[test]
fn test_missing_property() {
    let err = run_err("let o = {}\nlet v = o.nope");
    assert_eq!(err.code, errors::PROPERTY_NOT_FOUND);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_list_index_length_and_append() {
    let (env, _) = run("let l = [10, 20]\nl[2] = 30\nl[0] = 5\nlet n = l.length\nlet last = l[2]\nlet none = l[9]");
    assert_eq!(global(&env, "l"), Val::List(vec![Val::Num(5.0), Val::Num(20.0), Val::Num(30.0)]));
    assert_eq!(global(&env, "n"), Val::Num(3.0));
    assert_eq!(global(&env, "last"), Val::Num(30.0));
    assert_eq!(global(&env, "none"), Val::Null);
}

#[test]
fn test_list_index_out_of_range() {
    assert_eq!(run_err("let l = []\nl[3] = 1").code, errors::ARGUMENT_ERROR);
}

#[test]
fn test_calling_non_function() {
    assert_eq!(run_err("let x = 1\nx()").code, errors::NOT_CALLABLE);
    assert_eq!(run_err("let o = {f: 1}\no.f()").code, errors::NOT_CALLABLE);
}

#[test]
fn test_print_collects_output() {
    let mut env = Env::with_globals(hashmap! {
        "print".to_string() => Val::Native(NativeFn::Print),
    });
    let mut rt = PureRuntime::default();

    run_source("print('a', 1, [true, null])\nprint({k: 2.5})", &mut env, &mut rt).unwrap();

    assert_eq!(rt.output, vec!["a 1 [true, null]", "{k: 2.5}"]);
}

#[test]
fn test_parse_error_code() {
    let err = run_err("let = 1");
    assert_eq!(err.code, errors::PARSE_ERROR);
}

/* ===================== Host Dispatch ===================== */

#[test]
fn test_host_property_assignment() {
    let mut env = host_env();
    let mut rt = FakeRuntime::default();

    run_source("p.h = 'Intro'\nc.p.h = c.p.h + '!'", &mut env, &mut rt).unwrap();

    assert_eq!(rt.headlines.get(&NodeId(0)).map(String::as_str), Some("Intro!"));
}

#[test]
fn test_host_method_call() {
    let mut env = host_env();
    let mut rt = FakeRuntime::default();

    run_source("let v = demo.echo(42)\ndemo.bind('w', Label('x'))", &mut env, &mut rt).unwrap();

    assert_eq!(env.get("v"), Some(&Val::Num(42.0)));
    assert_eq!(env.get("w"), Some(&Val::Null));
    assert_eq!(rt.calls, vec!["Label(1)"]);
}

#[test]
fn test_host_errors_carry_location() {
    let mut env = host_env();
    let mut rt = FakeRuntime::default();

    let err = run_source("let a = 1\ndemo.nothing()", &mut env, &mut rt).unwrap_err();

    assert_eq!(err.code, errors::PROPERTY_NOT_FOUND);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_pure_runtime_rejects_host_values() {
    let mut env = host_env();
    let mut rt = PureRuntime::default();

    let err = run_source("p.h = 'x'", &mut env, &mut rt).unwrap_err();
    assert_eq!(err.code, errors::HOST_ERROR);
}
