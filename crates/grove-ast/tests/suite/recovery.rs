use grove_ast::{NodeKind, SYNTAX_ERROR};
use pretty_assertions::assert_eq;

use crate::{block_statements, build, expr_of, method};

#[test]
fn assignment_without_value_collapses_to_its_target() {
    let result = build("x =\n");
    let module = &result.module;

    assert_eq!(result.recovery.collapsed, 1);
    assert_eq!(module.statements.len(), 1);
    let expr = expr_of(module, module.statements[0]);
    match module.ast.kind(expr) {
        NodeKind::Variable { name } => assert_eq!(name, "x"),
        other => panic!("expected the bare target, got {other:?}"),
    }
    assert!(module.ast.node(expr).recovered);
    assert_eq!(module.ast.node(expr).range().start, 0);

    let syntax: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == SYNTAX_ERROR)
        .collect();
    assert_eq!(syntax.len(), 1);
}

#[test]
fn declaration_without_value_loses_it() {
    let result = build("def y =\n");
    let module = &result.module;

    assert_eq!(result.recovery.collapsed, 1);
    let expr = expr_of(module, module.statements[0]);
    match module.ast.kind(expr) {
        NodeKind::Declaration(decl) => {
            assert!(decl.value.is_none());
            assert_eq!(module.ast.node(decl.target).name(), Some("y"));
        }
        other => panic!("expected a declaration, got {other:?}"),
    }
    assert!(module.ast.node(expr).recovered);
}

#[test]
fn clean_source_has_nothing_recovered() {
    let result = build("class A {\n  int f(int a) {\n    return a + 1\n  }\n}\n");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.recovery.recovered, Vec::new());
    assert_eq!(result.recovery.collapsed, 0);
    assert_eq!(result.module.ast.recovered_nodes().count(), 0);
}

#[test]
fn recovered_nodes_match_the_report() {
    let result = build("class A {\n  void m() {\n    x =\n    y = 2\n  }\n}\n");
    let module = &result.module;

    let mut flagged: Vec<_> = module.ast.recovered_nodes().collect();
    let mut reported = result.recovery.recovered.clone();
    flagged.sort();
    reported.sort();
    assert_eq!(flagged, reported);
    assert!(!reported.is_empty());

    // The neighbouring statement is untouched.
    let (_, m) = method(module, module.types[0], "m");
    let statements = block_statements(module, m.body.unwrap());
    assert_eq!(statements.len(), 2);
    assert!(module
        .ast
        .descendants(statements[1])
        .all(|id| !module.ast.node(id).recovered));
}
