//! Tests for the semantic validation system

use std::collections::BTreeSet;

use super::*;
use crate::interpreter::parser::parse_fragment;

// ============================================================================
// Helper Functions
// ============================================================================

fn validate(source: &str) -> Vec<ValidationError> {
    validate_with(source, &[])
}

fn validate_with(source: &str, known: &[&str]) -> Vec<ValidationError> {
    let script = parse_fragment(source).expect("Parse should succeed");
    let known: BTreeSet<String> = known.iter().map(|s| s.to_string()).collect();
    validate_script(&script, source, &known)
}

fn for_rule<'a>(errors: &'a [ValidationError], rule_id: &str) -> Vec<&'a ValidationError> {
    errors.iter().filter(|e| e.rule_id == rule_id).collect()
}

// ============================================================================
// Undefined Variable Tests
// ============================================================================

#[test]
fn test_undefined_variable_simple() {
    let errors = validate("let y = x + 1");

    let undef = for_rule(&errors, "undefined-variable");
    assert_eq!(undef.len(), 1);
    assert!(undef[0].message.contains("'x'"));
    assert!(undef[0].is_error());
}

#[test]
fn test_undefined_variable_self_reference() {
    let errors = validate("let x = x + 1");
    assert_eq!(for_rule(&errors, "undefined-variable").len(), 1);
}

#[test]
fn test_standard_bindings_are_known() {
    let source = r#"
let w = Label("hello", {position: "center"})
demo.retain(w)
p.b = c.p.h
user.count = 1
print(Callout, Title, Image, Text)
"#;
    let errors = validate(source);
    assert!(for_rule(&errors, "undefined-variable").is_empty());
}

#[test]
fn test_names_from_earlier_fragments() {
    assert!(!validate("print(title)").is_empty());
    assert!(validate_with("print(title)", &["title"]).is_empty());
}

#[test]
fn test_plain_assignment_binds() {
    let errors = validate("count = 1\nprint(count)");
    assert!(for_rule(&errors, "undefined-variable").is_empty());
}

#[test]
fn test_member_assignment_needs_binding() {
    let errors = validate("thing.x = 1");
    let undef = for_rule(&errors, "undefined-variable");
    assert_eq!(undef.len(), 1);
    assert!(undef[0].message.contains("'thing'"));
}

#[test]
fn test_demo_bind_defines_name() {
    let errors = validate("demo.bind('banner', Title('Intro'))\nbanner.x = 1");
    assert!(for_rule(&errors, "undefined-variable").is_empty());
}

#[test]
fn test_block_scoped_let_does_not_leak() {
    let source = "if (true) {\n    let inner = 1\n    print(inner)\n}\nprint(inner)";
    let errors = validate(source);

    let undef = for_rule(&errors, "undefined-variable");
    assert_eq!(undef.len(), 1);
    assert_eq!(undef[0].span.start_line, 4);
}

#[test]
fn test_for_loop_binding_in_scope() {
    let source = "for (let n of c.p.children()) {\n    print(n.h)\n}\nprint(n)";
    let errors = validate(source);

    let undef = for_rule(&errors, "undefined-variable");
    assert_eq!(undef.len(), 1);
    assert!(undef[0].message.contains("'n'"));
}

// ============================================================================
// Unused Variable Tests
// ============================================================================

#[test]
fn test_unused_block_variable_warns() {
    let errors = validate("if (true) {\n    let w = Label('hi')\n}");

    let unused = for_rule(&errors, "unused-variable");
    assert_eq!(unused.len(), 1);
    assert!(!unused[0].is_error());
    assert!(!has_errors(
        &parse_fragment("if (true) {\n    let w = Label('hi')\n}").expect("parse"),
        "",
        &BTreeSet::new()
    ));
}

#[test]
fn test_top_level_let_is_not_unused() {
    let errors = validate("let w = Label('kept for the next step')");
    assert!(for_rule(&errors, "unused-variable").is_empty());
}

#[test]
fn test_underscore_prefix_exempt() {
    let errors = validate("for (let _n of [1, 2]) {\n    print('tick')\n}");
    assert!(for_rule(&errors, "unused-variable").is_empty());
}

#[test]
fn test_unused_loop_binding() {
    let errors = validate("for (let n of [1, 2]) {\n    print('tick')\n}");
    assert_eq!(for_rule(&errors, "unused-variable").len(), 1);
}

// ============================================================================
// Validator
// ============================================================================

#[test]
fn test_errors_sorted_by_position() {
    let errors = validate("print(b)\nprint(a)");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("'b'"));
    assert!(errors[1].message.contains("'a'"));
}

#[test]
fn test_display_format() {
    let errors = validate("print(x)");
    assert_eq!(
        errors[0].to_string(),
        "error at line 1, col 7: Undefined variable 'x' [undefined-variable]"
    );
}

#[test]
fn test_rules_listed() {
    let ids: Vec<&str> = Validator::new().rules().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["undefined-variable", "unused-variable"]);
}
