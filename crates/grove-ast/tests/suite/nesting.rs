use grove_ast::ast::{BinaryOp, ConstValue};
use grove_ast::{build_module, codes, ConvertOptions, NodeKind};

use crate::expr_of;

#[test]
fn deep_expression_becomes_a_placeholder() {
    let depth = 12;
    let src = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
    let options = ConvertOptions { max_nesting_depth: 8 };
    let result = build_module(&src, &options).expect("nesting is not fatal");

    let too_deep: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == codes::NESTING_TOO_DEEP)
        .collect();
    assert_eq!(too_deep.len(), 1, "{:?}", result.diagnostics);
    assert!(result
        .module
        .ast
        .iter()
        .any(|(_, node)| node.kind.is_error_placeholder()));
    assert!(matches!(
        result.module.ast.kind(result.module.statements[0]),
        NodeKind::ExprStmt { .. }
    ));
}

#[test]
fn shallow_expression_is_left_alone() {
    let src = "x = ((1))\n";
    let options = ConvertOptions { max_nesting_depth: 8 };
    let result = build_module(src, &options).expect("converts");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn pathological_nesting_does_not_overflow() {
    let depth = 5000;
    let src = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
    let result = build_module(&src, &ConvertOptions::default()).expect("nesting is not fatal");
    assert!(result.has_errors());
}

#[test]
fn long_operator_chain_is_not_nesting() {
    let terms = 2000;
    let src = format!("x = {}\n", vec!["1"; terms].join(" + "));
    let result = build_module(&src, &ConvertOptions { max_nesting_depth: 8 }).expect("converts");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let module = &result.module;
    let assign = expr_of(module, module.statements[0]);
    let NodeKind::Binary { op: BinaryOp::Assign, rhs, .. } = module.ast.kind(assign) else {
        panic!("expected an assignment, got {:?}", module.ast.kind(assign));
    };
    assert_eq!(module.ast.node(*rhs).range().start, src.find('1').unwrap());
    assert_eq!(module.ast.node(*rhs).range().end, src.trim_end().len());

    let mut spine = 0;
    let mut node = *rhs;
    while let NodeKind::Binary { op: BinaryOp::Plus, lhs, rhs } = module.ast.kind(node) {
        assert!(matches!(
            module.ast.kind(*rhs),
            NodeKind::Constant(ConstValue::Number(_))
        ));
        spine += 1;
        node = *lhs;
    }
    assert_eq!(spine, terms - 1);
    assert!(matches!(
        module.ast.kind(node),
        NodeKind::Constant(ConstValue::Number(_))
    ));
}

#[test]
fn parentheses_in_a_chain_still_count() {
    let src = format!("x = 1 + {}1{}\n", "(".repeat(12), ")".repeat(12));
    let result = build_module(&src, &ConvertOptions { max_nesting_depth: 8 }).expect("converts");
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == codes::NESTING_TOO_DEEP));
}
