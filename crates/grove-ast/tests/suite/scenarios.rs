use grove_ast::ast::{ConstValue, Modifiers};
use grove_ast::{build_module, ConvertError, ConvertOptions, NodeKind, SYNTAX_ERROR};
use grove_syntax::LiteralValue;
use pretty_assertions::assert_eq;

use crate::{block_statements, build, expr_of, method};

#[test]
fn bare_return_before_closing_brace_is_flagged() {
    let src = "class Foo { void bar() { return } }";
    let result = build(src);
    let module = &result.module;

    assert_eq!(module.types.len(), 1);
    let foo = module.types[0];
    assert_eq!(module.ast.node(foo).name(), Some("Foo"));

    let (bar, decl) = method(module, foo, "bar");
    assert!(decl.modifiers.contains(Modifiers::PUBLIC));
    assert!(decl.synthetic_public);
    let statements = block_statements(module, decl.body.expect("bar has a body"));
    assert_eq!(statements.len(), 1);

    let ret = statements[0];
    assert!(matches!(module.ast.kind(ret), NodeKind::Return { expr: None }));
    assert_eq!(module.ast.node(ret).range().start, src.find("return").unwrap());
    assert!(module.ast.node(ret).recovered);
    assert!(!module.ast.node(bar).recovered);
    assert!(!module.ast.node(foo).recovered);
    assert_eq!(result.recovery.recovered, vec![ret]);

    assert!(result.has_errors());
    assert!(result.diagnostics.iter().all(|d| d.code == SYNTAX_ERROR));
    assert!(!result.encountered_unrecoverable_error);
}

#[test]
fn duplicate_named_argument_aborts_the_file() {
    let err = build_module("foo(a: 1, a: 2)\n", &ConvertOptions::default()).unwrap_err();
    assert!(err.is_structural(), "{err:?}");
    assert_eq!(err.message(), "Duplicate named parameter 'a' found.");
    match err {
        ConvertError::Structural { start, .. } => assert_eq!(start.line, 1),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_expression_does_not_spread_to_siblings() {
    let src = "class A {\n  void one() { x = (1 + ) }\n  void two() { z = 3 }\n}\nclass B {}\n";
    let result = build(src);
    let module = &result.module;

    assert_eq!(module.types.len(), 2);
    let a = module.types[0];
    let (_, one) = method(module, a, "one");
    let (two_id, two) = method(module, a, "two");

    let one_body = one.body.unwrap();
    let placeholders: Vec<_> = module
        .ast
        .descendants(one_body)
        .filter(|id| module.ast.kind(*id).is_error_placeholder())
        .collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(module.ast.kind(placeholders[0]), &NodeKind::Constant(ConstValue::Error));

    let statements = block_statements(module, two.body.unwrap());
    assert_eq!(statements.len(), 1);
    match module.ast.kind(expr_of(module, statements[0])) {
        NodeKind::Binary { rhs, .. } => assert_eq!(
            module.ast.kind(*rhs),
            &NodeKind::Constant(ConstValue::Number(LiteralValue::Int(3)))
        ),
        other => panic!("expected an assignment, got {other:?}"),
    }
    assert!(module.ast.descendants(two_id).all(|id| !module.ast.node(id).recovered));
    assert_eq!(module.ast.node(module.types[1]).name(), Some("B"));
}

#[test]
fn damaged_assignment_target_keeps_the_file() {
    for target in ["x +", "++", "(x as)", "x as"] {
        let src = format!("class A {{\n  void one() {{ {target} = 1 }}\n  void two() {{ z = 3 }}\n}}\n");
        let result = build(&src);
        let module = &result.module;
        assert!(result.has_errors(), "{target}");
        assert!(result.diagnostics.iter().any(|d| d.code == SYNTAX_ERROR), "{target}");

        let a = module.types[0];
        let (two_id, two) = method(module, a, "two");
        let statements = block_statements(module, two.body.unwrap());
        assert_eq!(statements.len(), 1, "{target}");
        assert!(matches!(
            module.ast.kind(expr_of(module, statements[0])),
            NodeKind::Binary { .. }
        ));
        assert!(module.ast.descendants(two_id).all(|id| !module.ast.node(id).recovered));
    }
}

#[test]
fn invalid_assignment_target_is_still_structural() {
    for src in ["-x = 1\n", "true = x\n"] {
        let err = build_module(src, &ConvertOptions::default()).unwrap_err();
        assert!(err.is_structural(), "{src:?}: {err:?}");
    }
}

#[test]
fn script_statements_and_methods() {
    let src = "def x = 1\nprintln x\ndef twice(n) { n * 2 }\n";
    let result = build(src);
    let module = &result.module;
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    assert_eq!(module.methods.len(), 1);
    assert_eq!(module.ast.node(module.methods[0]).name(), Some("twice"));
    assert_eq!(module.statements.len(), 2);

    match module.ast.kind(expr_of(module, module.statements[0])) {
        NodeKind::Declaration(decl) => {
            assert_eq!(module.ast.node(decl.target).name(), Some("x"));
            assert!(decl.ty.is_none());
            assert!(decl.value.is_some());
        }
        other => panic!("expected a declaration, got {other:?}"),
    }
    match module.ast.kind(expr_of(module, module.statements[1])) {
        NodeKind::MethodCall {
            implicit_this,
            method,
            ..
        } => {
            assert!(*implicit_this);
            assert_eq!(
                module.ast.kind(*method),
                &NodeKind::Constant(ConstValue::String("println".into()))
            );
        }
        other => panic!("expected a call, got {other:?}"),
    }

    let script = module.script_range.expect("script range");
    assert_eq!(script.range.start, 0);
    assert_eq!(script.start.line, 1);
    assert_eq!(script.end.line, 2);
}

#[test]
fn empty_module_gets_a_return_statement() {
    let result = build("package p\nimport java.util.List\n");
    let module = &result.module;
    assert_eq!(module.package_name(), Some("p"));
    assert_eq!(module.imports.len(), 1);
    assert_eq!(module.statements.len(), 1);
    match module.ast.kind(module.statements[0]) {
        NodeKind::Return { expr: Some(value) } => {
            assert_eq!(module.ast.kind(*value), &NodeKind::Constant(ConstValue::Null));
        }
        other => panic!("expected a return, got {other:?}"),
    }
    assert!(!result.encountered_unrecoverable_error);
}
