use grove_ast::ConvertError;
use pretty_assertions::assert_eq;

use crate::build_err;

fn message(src: &str) -> String {
    let err = build_err(src);
    assert!(err.is_structural(), "expected a structural error, got {err:?}");
    err.message()
}

#[test]
fn try_needs_catch_or_finally() {
    assert_eq!(
        message("try { a() }\n"),
        "A try statement must have at least one catch or finally block."
    );
}

#[test]
fn second_default_case_is_rejected() {
    assert_eq!(
        message("switch (x) {\n  default: a()\n  default: b()\n}\n"),
        "The default case is already defined."
    );
}

#[test]
fn class_inside_a_method_body_is_rejected() {
    assert!(message("def f() {\n  class X {}\n}\n").starts_with("Class definition not expected here."));
}

#[test]
fn constructor_call_must_come_first() {
    assert_eq!(
        message("class P {\n  P() {\n    foo()\n    this(1)\n  }\n}\n"),
        "Constructor call must be the first statement in a constructor."
    );
}

#[test]
fn constant_cannot_be_assigned() {
    assert_eq!(
        message("1 = x\n"),
        "[1] is a constant expression, but it should be a variable expression"
    );
}

#[test]
fn method_call_cannot_be_assigned() {
    assert_eq!(
        message("foo() = 1\n"),
        "\"foo()\" is a method call expression, but it should be a variable expression"
    );
}

#[test]
fn repeated_modifier_is_rejected() {
    assert_eq!(
        message("class A {\n  static static int x\n}\n"),
        "Cannot repeat modifier: static"
    );
}

#[test]
fn volatile_method_is_rejected() {
    assert_eq!(
        message("class A {\n  volatile void m() { }\n}\n"),
        "Method has an incorrect modifier 'volatile'."
    );
}

#[test]
fn structural_errors_carry_their_location() {
    let src = "x = 1\ntry { a() }\n";
    match build_err(src) {
        ConvertError::Structural { span, start, .. } => {
            assert_eq!(start.line, 2);
            assert_eq!(start.col, 1);
            assert_eq!(span.start, src.find("try").unwrap());
        }
        other => panic!("unexpected error {other:?}"),
    }
}
