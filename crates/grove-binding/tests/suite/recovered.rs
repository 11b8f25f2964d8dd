use std::sync::Arc;

use grove_ast::ast::Modifiers;
use grove_ast::NodeKind;
use grove_binding::{BindingResolver, RecoveredSource, SyntaxType, TypeKind};
use pretty_assertions::assert_eq;

use crate::{find_node, fixture, local_declaration, parse, FOO_SOURCE};

fn syntactic(resolver: &BindingResolver, syntax: SyntaxType) -> Arc<grove_binding::TypeBinding> {
    resolver.recovered_type(RecoveredSource::SyntacticType(syntax))
}

#[test]
fn recovered_types_report_nothing_they_cannot_derive() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let ty = syntactic(&resolver, SyntaxType::new("q.Unknown"));

    assert!(ty.is_recovered());
    assert_eq!(ty.name(), "Unknown");
    assert_eq!(ty.qualified_name(), "q.Unknown");
    assert_eq!(ty.kind(), TypeKind::Class);
    assert_eq!(ty.modifiers(), Modifiers::NONE);
    assert!(ty.declared_fields(&resolver).is_empty());
    assert!(ty.declared_methods(&resolver).is_empty());
    assert!(ty.declared_types(&resolver).is_empty());
    assert!(ty.interfaces(&resolver).is_empty());
    assert!(ty.annotations(&resolver).is_empty());
    assert!(ty.package(&resolver).is_none());

    let superclass = ty.superclass(&resolver).expect("java.lang.Object");
    assert!(Arc::ptr_eq(
        &superclass,
        &resolver.get_type_binding(fx.object).unwrap()
    ));

    let object = syntactic(&resolver, SyntaxType::new("java.lang.Object"));
    assert!(object.superclass(&resolver).is_none());
}

#[test]
fn recovered_arrays_wrap_and_unwrap_dimensions() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let grid = syntactic(&resolver, SyntaxType::new("Grid").with_dimensions(2));

    assert_eq!(grid.kind(), TypeKind::Array);
    assert_eq!(grid.name(), "Grid[][]");
    assert_eq!(grid.component_type(&resolver).unwrap().name(), "Grid[]");
    let element = grid.element_type(&resolver).unwrap();
    assert_eq!(element.name(), "Grid");
    assert!(!element.is_array());
    assert!(element.element_type(&resolver).is_none());

    let deeper = grid.create_array_type(&resolver, 1).unwrap();
    assert_eq!(deeper.dimensions(), 3);
    assert_eq!(deeper.name(), "Grid[][][]");

    // Equality is by key, not by what was wrapped.
    let rebuilt = element.create_array_type(&resolver, 2).unwrap();
    assert!(rebuilt.is_equal_to(&grid));
    let wrapped = resolver.recovered_type(RecoveredSource::Inner {
        inner: element.clone(),
        dimensions: 2,
    });
    assert!(wrapped.is_equal_to(&grid));
    assert_eq!(wrapped.component_type(&resolver).unwrap().name(), "Grid[]");
    assert!(Arc::ptr_eq(&wrapped.element_type(&resolver).unwrap(), &element));
}

#[test]
fn resolved_element_types_are_wrapped_when_the_engine_has_no_array() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let string = resolver.get_type_binding(fx.string).unwrap();
    let strings = string.create_array_type(&resolver, 1).expect("recovered array");
    assert!(strings.is_recovered());
    assert_eq!(strings.qualified_name(), "java.lang.String[]");
    assert!(Arc::ptr_eq(&strings.element_type(&resolver).unwrap(), &string));

    let strict = BindingResolver::new(fx.model.clone());
    let string = strict.get_type_binding(fx.string).unwrap();
    assert!(string.create_array_type(&strict, 1).is_none());
}

#[test]
fn declarations_without_bindings_recover_from_syntax() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);

    let names = local_declaration(&module, "names");
    let ty = resolver.type_of_declaration(&module, names).expect("recovered");
    assert!(ty.is_recovered());
    assert_eq!(ty.name(), "List<String>");
    let args = ty.type_arguments(&resolver);
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].name(), "String");

    let grid = local_declaration(&module, "grid");
    let grid_ty = resolver.type_of_declaration(&module, grid).unwrap();
    assert_eq!(grid_ty.dimensions(), 2);
    assert!(grid_ty.type_arguments(&resolver).is_empty());
    assert_eq!(grid_ty.qualified_name(), "Foo[][]");

    let any = local_declaration(&module, "any");
    let any_ty = resolver.type_of_declaration(&module, any).unwrap();
    assert_eq!(any_ty.qualified_name(), "java.lang.Object");
    assert!(any_ty.superclass(&resolver).is_none());

    let variable = resolver.resolve_variable(&module, names).expect("recovered variable");
    assert!(variable.is_recovered());
    assert_eq!(variable.name(), "names");
    assert!(variable.ty(&resolver).unwrap().is_equal_to(&ty));

    let type_ref = match module.ast.kind(names) {
        NodeKind::Declaration(decl) => decl.ty.expect("written type"),
        other => panic!("expected a declaration, got {other:?}"),
    };
    let from_ref = resolver.resolve_type(&module, type_ref).unwrap();
    assert!(from_ref.is_equal_to(&ty));
    assert_eq!(from_ref.key(), "Recovered#List<String>#0");
}

#[test]
fn nothing_is_recovered_unless_asked() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());
    let names = local_declaration(&module, "names");
    assert!(resolver.type_of_declaration(&module, names).is_none());
    assert!(resolver.resolve_variable(&module, names).is_none());

    let bar = module
        .find_member(module.types[0], "bar", |kind| matches!(kind, NodeKind::Method(_)))
        .unwrap();
    let param_type = find_node(&module, bar, |kind| matches!(kind, NodeKind::TypeRef(_)));
    assert!(resolver.resolve_type(&module, param_type).is_none());
    assert!(resolver.resolve_method(&module, bar).is_none());
}
