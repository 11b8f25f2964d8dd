use grove_ast::ast::{Modifiers, TypeKind};
use grove_ast::{codes, keys, NodeKind};
use grove_types::Span;
use pretty_assertions::assert_eq;

use crate::{build, method};

#[test]
fn nested_types_get_qualified_names() {
    let result = build("package p.q\nclass Outer {\n  interface Inner {}\n}\n");
    let module = &result.module;
    let inner = module.find_type("p.q.Outer$Inner").expect("inner type");
    match module.ast.kind(inner) {
        NodeKind::Type(decl) => {
            assert_eq!(decl.kind, TypeKind::Interface);
            assert_eq!(decl.outer, Some(module.types[0]));
            assert!(decl
                .modifiers
                .contains(Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT));
        }
        other => panic!("expected a type, got {other:?}"),
    }
    assert_eq!(module.all_types().len(), 2);
}

#[test]
fn interface_methods_are_abstract_and_need_no_body() {
    let result = build("interface I {\n  void m()\n}\n");
    let module = &result.module;
    let (_, decl) = method(module, module.types[0], "m");
    assert!(decl.modifiers.contains(Modifiers::ABSTRACT | Modifiers::PUBLIC));
    assert!(decl.body.is_none());
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn class_method_without_body_gets_an_empty_one() {
    let result = build("class A {\n  void m()\n}\n");
    let module = &result.module;
    let (_, decl) = method(module, module.types[0], "m");
    let body = decl.body.expect("fabricated body");
    assert!(matches!(module.ast.kind(body), NodeKind::Block { statements } if statements.is_empty()));
    assert_eq!(
        result
            .diagnostics
            .iter()
            .map(|d| d.code)
            .collect::<Vec<_>>(),
        vec![codes::MISSING_METHOD_BODY]
    );
}

#[test]
fn methods_record_name_range_and_closing_paren() {
    let src = "class A {\n  void m(int a) { }\n}\n";
    let result = build(src);
    let module = &result.module;
    let (id, decl) = method(module, module.types[0], "m");
    let node = module.ast.node(id);

    let name_at = src.find("m(").unwrap();
    assert_eq!(node.name_range, Some(Span::new(name_at, name_at + 1)));
    let rparen = src.find(") {").unwrap() + 1;
    assert_eq!(node.meta.offset(keys::RPAREN_OFFSET), Some(rparen));

    assert_eq!(decl.params.len(), 1);
    let param = module.ast.node(decl.params[0]);
    assert_eq!(param.name(), Some("a"));
    let a_at = src.find("a)").unwrap();
    assert_eq!(param.name_range, Some(Span::new(a_at, a_at + 1)));
}

#[test]
fn fields_without_access_modifier_back_properties() {
    let src = "class A {\n  int a = 1, b\n  private String c\n}\n";
    let result = build(src);
    let module = &result.module;
    let ty = module.types[0];
    let field = |name: &str| {
        module
            .find_member(ty, name, |kind| matches!(kind, NodeKind::Field(_)))
            .unwrap_or_else(|| panic!("no field {name}"))
    };

    let a = field("a");
    match module.ast.kind(a) {
        NodeKind::Field(decl) => {
            assert_eq!(decl.modifiers, Modifiers::PRIVATE);
            assert_eq!(decl.property, Some(Modifiers::PUBLIC));
            assert!(decl.initializer.is_some());
        }
        other => panic!("expected a field, got {other:?}"),
    }
    let b_at = src.find("b\n").unwrap();
    assert_eq!(module.ast.node(a).meta.offset(keys::END2POS), Some(b_at - 1));
    assert!(!module.ast.node(field("b")).meta.contains(keys::END2POS));

    match module.ast.kind(field("c")) {
        NodeKind::Field(decl) => {
            assert_eq!(decl.modifiers, Modifiers::PRIVATE);
            assert_eq!(decl.property, None);
        }
        other => panic!("expected a field, got {other:?}"),
    }
}

#[test]
fn static_initializer_records_block_start() {
    let src = "class A {\n  static { x = 1 }\n}\n";
    let result = build(src);
    let module = &result.module;
    let NodeKind::Type(decl) = module.ast.kind(module.types[0]) else {
        panic!("expected a type");
    };
    let init = decl
        .members
        .iter()
        .copied()
        .find(|id| matches!(module.ast.kind(*id), NodeKind::Initializer { is_static: true, .. }))
        .expect("static initializer");
    assert_eq!(
        module.ast.node(init).meta.offset(keys::STATIC_OFFSET),
        Some(src.find("{ x").unwrap())
    );
}

#[test]
fn constructors_allow_a_leading_this_call() {
    let result = build("class P {\n  P(int a) { this(a, 0) }\n  P(int a, int b) { }\n}\n");
    let module = &result.module;
    let NodeKind::Type(decl) = module.ast.kind(module.types[0]) else {
        panic!("expected a type");
    };
    let ctors: Vec<_> = decl
        .members
        .iter()
        .filter(|id| matches!(module.ast.kind(**id), NodeKind::Constructor(_)))
        .collect();
    assert_eq!(ctors.len(), 2);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}
