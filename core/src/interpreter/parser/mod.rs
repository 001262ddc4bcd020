//! PEST-based parser for demo fragments
//!
//! Produces the AST consumed by the executor, with span information for error
//! reporting.

use std::collections::BTreeSet;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use super::ast::{BinaryOp, Expr, MemberAccess, Span, Stmt, UnaryOp};

pub mod semantic_validator;


/* ===================== Script Definition ===================== */

/// One parsed fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDef {
    /// Top-level statements, executed against the shared bindings
    pub body: Vec<Stmt>,
    /// Span of the entire fragment
    #[serde(default)]
    pub span: Span,
}

impl ScriptDef {
    /// Names this fragment leaves behind in the shared bindings
    ///
    /// Top-level `let`s, top-level plain assignments and `demo.bind("name", ..)`
    /// calls with a literal name.
    pub fn declared_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for stmt in &self.body {
            match stmt {
                Stmt::Let { name, .. } => {
                    names.insert(name.clone());
                }
                Stmt::Assign { var, path, .. } if path.is_empty() => {
                    names.insert(var.clone());
                }
                _ => {}
            }
        }
        for stmt in &self.body {
            collect_bound_names_stmt(stmt, &mut names);
        }
        names
    }
}

fn collect_bound_names_stmt(stmt: &Stmt, names: &mut BTreeSet<String>) {
    match stmt {
        Stmt::Block { body, .. } => body.iter().for_each(|s| collect_bound_names_stmt(s, names)),
        Stmt::Let { init, .. } => {
            if let Some(init) = init {
                collect_bound_names_expr(init, names);
            }
        }
        Stmt::Assign { value, .. } => collect_bound_names_expr(value, names),
        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            collect_bound_names_expr(test, names);
            collect_bound_names_stmt(then_s, names);
            if let Some(else_s) = else_s {
                collect_bound_names_stmt(else_s, names);
            }
        }
        Stmt::ForOf { iterable, body, .. } => {
            collect_bound_names_expr(iterable, names);
            collect_bound_names_stmt(body, names);
        }
        Stmt::Expr { expr, .. } => collect_bound_names_expr(expr, names),
    }
}

fn collect_bound_names_expr(expr: &Expr, names: &mut BTreeSet<String>) {
    if let Some(name) = bind_call_name(expr) {
        names.insert(name.to_string());
    }
    match expr {
        Expr::LitList { elements, .. } => {
            elements.iter().for_each(|e| collect_bound_names_expr(e, names))
        }
        Expr::LitObj { properties, .. } => properties
            .iter()
            .for_each(|(_, _, e)| collect_bound_names_expr(e, names)),
        Expr::Member { object, .. } => collect_bound_names_expr(object, names),
        Expr::Index { object, index, .. } => {
            collect_bound_names_expr(object, names);
            collect_bound_names_expr(index, names);
        }
        Expr::Call { callee, args, .. } => {
            collect_bound_names_expr(callee, names);
            args.iter().for_each(|a| collect_bound_names_expr(a, names));
        }
        Expr::Unary { operand, .. } => collect_bound_names_expr(operand, names),
        Expr::Binary { left, right, .. } => {
            collect_bound_names_expr(left, names);
            collect_bound_names_expr(right, names);
        }
        _ => {}
    }
}

/// `demo.bind("name", value)` with a literal name returns that name
pub fn bind_call_name(expr: &Expr) -> Option<&str> {
    let Expr::Call { callee, args, .. } = expr else {
        return None;
    };
    let Expr::Member {
        object, property, ..
    } = callee.as_ref()
    else {
        return None;
    };
    match (object.as_ref(), property.as_str(), args.first()) {
        (Expr::Ident { name, .. }, "bind", Some(Expr::LitStr { v, .. })) if name == "demo" => {
            Some(v)
        }
        _ => None,
    }
}

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/script.pest"]
struct ScriptParser;

/* ===================== Error Types ===================== */

#[derive(Debug)]
pub enum ParseError {
    PestError(String, Option<Span>),
    BuildError(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PestError(_, span) => *span,
            ParseError::BuildError(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::PestError(msg, _) => msg,
            ParseError::BuildError(msg, _) => msg,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let span = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => Some(Span {
                start: 0,
                end: 0,
                start_line: line.saturating_sub(1),
                start_col: col.saturating_sub(1),
                end_line: line.saturating_sub(1),
                end_col: col,
            }),
            pest::error::LineColLocation::Span((start_line, start_col), (end_line, end_col)) => {
                Some(Span {
                    start: 0,
                    end: 0,
                    start_line: start_line.saturating_sub(1),
                    start_col: start_col.saturating_sub(1),
                    end_line: end_line.saturating_sub(1),
                    end_col: end_col.saturating_sub(1),
                })
            }
        };
        ParseError::PestError(err.to_string(), span)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Span Helpers ===================== */

/// Convert a PEST pair's span to our Span type
fn pair_to_span(pair: &Pair<Rule>, source: &str) -> Span {
    let pest_span = pair.as_span();
    let start = pest_span.start();
    let end = pest_span.end();

    let (start_line, start_col) = offset_to_line_col(source, start);
    let (end_line, end_col) = offset_to_line_col(source, end);

    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/// Convert byte offset to (line, column) - 0-indexed
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count();
    let col = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count(),
        None => before.chars().count(),
    };
    (line, col)
}

/// Next child pair, or a build error naming what was expected
fn next_pair<'i>(inner: &mut Pairs<'i, Rule>, what: &str, span: Span) -> ParseResult<Pair<'i, Rule>> {
    inner
        .next()
        .ok_or_else(|| ParseError::BuildError(format!("Expected {}", what), Some(span)))
}

/* ===================== Public API ===================== */

/// Parse one fragment of demo script
pub fn parse_fragment(source: &str) -> ParseResult<ScriptDef> {
    let mut pairs = ScriptParser::parse(Rule::program, source)?;
    let program_span = Span::new(0, source.len(), 0, 0, 0, 0);
    let program = next_pair(&mut pairs, "program", program_span)?;
    let span = pair_to_span(&program, source);

    let mut inner = program.into_inner();
    let statements = next_pair(&mut inner, "statements", span)?;
    let body = build_statements(statements, source)?;

    Ok(ScriptDef { body, span })
}

/// Parse a single expression (testing and tooling API)
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let script = parse_fragment(source)?;
    match script.body.as_slice() {
        [Stmt::Expr { expr, .. }] => Ok(expr.clone()),
        _ => Err(ParseError::BuildError(
            "Expected a single expression".to_string(),
            Some(script.span),
        )),
    }
}

/* ===================== AST Builder ===================== */

fn build_statements(pair: Pair<Rule>, source: &str) -> ParseResult<Vec<Stmt>> {
    pair.into_inner()
        .map(|stmt_pair| build_statement(stmt_pair, source))
        .collect()
}

fn build_block(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();
    let statements = next_pair(&mut inner, "block statements", span)?;
    Ok(Stmt::Block {
        body: build_statements(statements, source)?,
        span,
    })
}

fn build_statement(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::statement => {
            let inner = next_pair(&mut pair.into_inner(), "statement", span)?;
            build_statement(inner, source)
        }
        Rule::let_stmt => {
            let mut inner = pair.into_inner();
            let name_pair = next_pair(&mut inner, "variable name", span)?;
            let name_span = pair_to_span(&name_pair, source);
            let init = inner
                .next()
                .map(|expr_pair| build_expression(expr_pair, source))
                .transpose()?;
            Ok(Stmt::Let {
                name: name_pair.as_str().to_string(),
                name_span,
                init,
                span,
            })
        }
        Rule::if_stmt => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, "condition", span)?, source)?;
            let then_s = build_block(next_pair(&mut inner, "block", span)?, source)?;
            let else_s = match inner.next() {
                Some(else_pair) if else_pair.as_rule() == Rule::if_stmt => {
                    Some(Box::new(build_statement(else_pair, source)?))
                }
                Some(else_pair) => Some(Box::new(build_block(else_pair, source)?)),
                None => None,
            };
            Ok(Stmt::If {
                test,
                then_s: Box::new(then_s),
                else_s,
                span,
            })
        }
        Rule::for_stmt => {
            let mut inner = pair.into_inner();
            let binding_pair = next_pair(&mut inner, "loop variable", span)?;
            let binding_span = pair_to_span(&binding_pair, source);
            let iterable = build_expression(next_pair(&mut inner, "iterable", span)?, source)?;
            let body = build_block(next_pair(&mut inner, "loop body", span)?, source)?;
            Ok(Stmt::ForOf {
                binding: binding_pair.as_str().to_string(),
                binding_span,
                iterable,
                body: Box::new(body),
                span,
            })
        }
        Rule::assign_stmt => build_assign_stmt(pair, source),
        Rule::expr_stmt => {
            let expr_pair = next_pair(&mut pair.into_inner(), "expression", span)?;
            let expr = build_expression(expr_pair, source)?;
            Ok(Stmt::Expr { expr, span })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected statement rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_assign_stmt(pair: Pair<Rule>, source: &str) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair, source);
    let inner: Vec<Pair<Rule>> = pair.into_inner().collect();

    let (var_pair, rest) = inner.split_first().ok_or_else(|| {
        ParseError::BuildError("Expected assignment target".to_string(), Some(span))
    })?;
    let (value_pair, path_pairs) = rest.split_last().ok_or_else(|| {
        ParseError::BuildError("Expected assigned value".to_string(), Some(span))
    })?;

    let mut path = Vec::with_capacity(path_pairs.len());
    for path_pair in path_pairs {
        let path_span = pair_to_span(path_pair, source);
        let mut path_inner = path_pair.clone().into_inner();
        let target = next_pair(&mut path_inner, "member", path_span)?;
        match path_pair.as_rule() {
            Rule::prop_path => path.push(MemberAccess::Prop {
                property: target.as_str().to_string(),
                span: path_span,
            }),
            _ => path.push(MemberAccess::Index {
                expr: build_expression(target, source)?,
                span: path_span,
            }),
        }
    }

    Ok(Stmt::Assign {
        var: var_pair.as_str().to_string(),
        var_span: pair_to_span(var_pair, source),
        path,
        value: build_expression(value_pair.clone(), source)?,
        span,
    })
}

fn build_binary_expr(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);
    let mut inner = pair.into_inner();

    let mut left = build_expression(next_pair(&mut inner, "operand", span)?, source)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_rule() {
            Rule::op_or => BinaryOp::Or,
            Rule::op_and => BinaryOp::And,
            Rule::op_eq => BinaryOp::Eq,
            Rule::op_ne => BinaryOp::Ne,
            Rule::op_lt => BinaryOp::Lt,
            Rule::op_lte => BinaryOp::Lte,
            Rule::op_gt => BinaryOp::Gt,
            Rule::op_gte => BinaryOp::Gte,
            Rule::op_add => BinaryOp::Add,
            Rule::op_sub => BinaryOp::Sub,
            Rule::op_mul => BinaryOp::Mul,
            Rule::op_div => BinaryOp::Div,
            Rule::op_mod => BinaryOp::Mod,
            other => {
                return Err(ParseError::BuildError(
                    format!("Expected operator, got {:?}", other),
                    Some(span),
                ))
            }
        };
        let right_pair = next_pair(&mut inner, "right operand after operator", span)?;
        let right = build_expression(right_pair, source)?;
        let new_span = left.span().merge(&right.span());
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: new_span,
        };
    }

    Ok(left)
}

fn build_expression(pair: Pair<Rule>, source: &str) -> ParseResult<Expr> {
    let span = pair_to_span(&pair, source);

    match pair.as_rule() {
        Rule::expression => {
            let inner = next_pair(&mut pair.into_inner(), "expression", span)?;
            build_expression(inner, source)
        }
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality_expr
        | Rule::comparison_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr => build_binary_expr(pair, source),
        Rule::unary_expr => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, "operand", span)?;
            let op = match first.as_rule() {
                Rule::op_not => UnaryOp::Not,
                Rule::op_neg => UnaryOp::Neg,
                _ => return build_expression(first, source),
            };
            let operand = build_expression(next_pair(&mut inner, "operand", span)?, source)?;
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            })
        }
        Rule::postfix_expr => {
            let mut inner = pair.into_inner();
            let mut expr = build_expression(next_pair(&mut inner, "primary", span)?, source)?;

            for suffix in inner {
                let suffix_span = pair_to_span(&suffix, source);
                let new_span = expr.span().merge(&suffix_span);
                let rule = suffix.as_rule();
                let mut suffix_inner = suffix.into_inner();
                expr = match rule {
                    Rule::call_suffix => {
                        let args = match suffix_inner.next() {
                            Some(arg_list) => arg_list
                                .into_inner()
                                .map(|arg| build_expression(arg, source))
                                .collect::<ParseResult<Vec<_>>>()?,
                            None => vec![],
                        };
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                            span: new_span,
                        }
                    }
                    Rule::member_suffix => {
                        let prop_pair = next_pair(&mut suffix_inner, "property", suffix_span)?;
                        Expr::Member {
                            object: Box::new(expr),
                            property: prop_pair.as_str().to_string(),
                            property_span: pair_to_span(&prop_pair, source),
                            span: new_span,
                        }
                    }
                    Rule::index_suffix => {
                        let index_pair = next_pair(&mut suffix_inner, "index", suffix_span)?;
                        Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(build_expression(index_pair, source)?),
                            span: new_span,
                        }
                    }
                    other => {
                        return Err(ParseError::BuildError(
                            format!("Unexpected postfix rule: {:?}", other),
                            Some(suffix_span),
                        ))
                    }
                };
            }

            Ok(expr)
        }
        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
            span,
        }),
        Rule::number => {
            let num_str = pair.as_str();
            let value = num_str.parse::<f64>().map_err(|e| {
                ParseError::BuildError(
                    format!("Failed to parse number '{}': {}", num_str, e),
                    Some(span),
                )
            })?;
            Ok(Expr::LitNum { v: value, span })
        }
        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
            span,
        }),
        Rule::null_lit => Ok(Expr::LitNull { span }),
        Rule::string => Ok(Expr::LitStr {
            v: build_string(pair, span)?,
            span,
        }),
        Rule::list_lit => {
            let elements = pair
                .into_inner()
                .map(|element| build_expression(element, source))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::LitList { elements, span })
        }
        Rule::obj_lit => {
            let mut properties = Vec::new();
            for prop in pair.into_inner() {
                let prop_span = pair_to_span(&prop, source);
                let mut prop_inner = prop.into_inner();
                let key_pair = next_pair(&mut prop_inner, "property key", prop_span)?;
                let key_span = pair_to_span(&key_pair, source);
                let key = match key_pair.as_rule() {
                    Rule::string => build_string(key_pair, key_span)?,
                    _ => key_pair.as_str().to_string(),
                };
                let value = build_expression(next_pair(&mut prop_inner, "property value", prop_span)?, source)?;
                properties.push((key, key_span, value));
            }
            Ok(Expr::LitObj { properties, span })
        }
        _ => Err(ParseError::BuildError(
            format!("Unexpected expression rule: {:?}", pair.as_rule()),
            Some(span),
        )),
    }
}

fn build_string(pair: Pair<Rule>, span: Span) -> ParseResult<String> {
    let content = next_pair(&mut pair.into_inner(), "string content", span)?;
    Ok(unescape(content.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
