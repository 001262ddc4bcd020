//! Runtime value types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::outline::NodeId;
use crate::widgets::WidgetId;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
    /// Handle to an outline node
    Node(NodeId),
    /// Handle to a widget created by the current run
    Widget(WidgetId),
    /// One of the objects the player exposes to scripts
    Host(HostObject),
    /// Built-in function
    Native(NativeFn),
}

/// Singleton objects bound into every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostObject {
    /// `demo`: the player itself
    Demo,
    /// `c`: the outline commander
    Commander,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeFn {
    Print,
    Label,
    Callout,
    Title,
    Image,
    Text,
}

impl NativeFn {
    pub fn name(&self) -> &'static str {
        match self {
            NativeFn::Print => "print",
            NativeFn::Label => "Label",
            NativeFn::Callout => "Callout",
            NativeFn::Title => "Title",
            NativeFn::Image => "Image",
            NativeFn::Text => "Text",
        }
    }
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Null => false,
            _ => true,
        }
    }

    /// Name used in type error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::List(_) => "list",
            Val::Obj(_) => "object",
            Val::Node(_) => "node",
            Val::Widget(_) => "widget",
            Val::Host(_) => "host object",
            Val::Native(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Val::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Val::Num(n) => write!(f, "{}", n),
            Val::Str(s) => write!(f, "{}", s),
            Val::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Val::Obj(map) => {
                // Sorted so output is stable
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, map[*key])?;
                }
                write!(f, "}}")
            }
            Val::Node(id) => write!(f, "<node {}>", id.0),
            Val::Widget(id) => write!(f, "<widget {}>", id.0),
            Val::Host(HostObject::Demo) => write!(f, "<demo>"),
            Val::Host(HostObject::Commander) => write!(f, "<commander>"),
            Val::Native(func) => write!(f, "<function {}>", func.name()),
        }
    }
}
