use std::sync::Arc;

use grove_ast::{ModuleNode, NodeId, NodeKind};
use grove_binding::{Binding, BindingError, BindingKind, BindingResolver, InternalRef};
use pretty_assertions::assert_eq;

use crate::{find_node, fixture, local_declaration, parse, FOO_SOURCE};

fn member(module: &ModuleNode, name: &str) -> NodeId {
    module
        .find_member(module.types[0], name, |kind| {
            matches!(kind, NodeKind::Field(_) | NodeKind::Method(_))
        })
        .unwrap_or_else(|| panic!("no member `{name}`"))
}

/// The `a` read by `def any = a`.
fn value_of_any(module: &ModuleNode) -> NodeId {
    let any = local_declaration(module, "any");
    match module.ast.kind(any) {
        NodeKind::Declaration(decl) => decl.value.expect("initializer"),
        other => panic!("expected a declaration, got {other:?}"),
    }
}

#[test]
fn corresponded_declarations_resolve_to_engine_bindings() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());

    let field = member(&module, "x");
    resolver.record_correspondence(field, InternalRef::Variable(fx.x));
    assert_eq!(resolver.corresponding_internal(field), Some(InternalRef::Variable(fx.x)));
    assert_eq!(resolver.corresponding_node(InternalRef::Variable(fx.x)), Some(field));

    let x = resolver.resolve_variable(&module, field).expect("field binding");
    assert!(Arc::ptr_eq(&x, &resolver.get_variable_binding(fx.x).unwrap()));
    let int = resolver.type_of_declaration(&module, field).expect("declared type");
    assert!(int.is_primitive());
    assert_eq!(int.key(), "I");

    let type_ref = find_node(&module, field, |kind| matches!(kind, NodeKind::TypeRef(_)));
    assert!(resolver.resolve_type(&module, type_ref).is_none());
    resolver.record_correspondence(type_ref, InternalRef::Type(fx.int));
    assert!(Arc::ptr_eq(&resolver.resolve_type(&module, type_ref).unwrap(), &int));

    // Only type references resolve as types.
    assert!(resolver.resolve_type(&module, field).is_none());
}

#[test]
fn methods_resolve_through_their_correspondence() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());

    let bar = member(&module, "bar");
    assert!(resolver.resolve_method(&module, bar).is_none());
    resolver.record_correspondence(bar, InternalRef::Method(fx.bar));
    let method = resolver.resolve_method(&module, bar).expect("method binding");
    assert_eq!(method.name(), "bar");
    assert_eq!(
        method.declaring_type(&resolver).unwrap().qualified_name(),
        "p.Foo"
    );

    // A correspondence of the wrong kind yields nothing.
    let get = member(&module, "get");
    resolver.record_correspondence(get, InternalRef::Type(fx.foo));
    assert!(resolver.resolve_method(&module, get).is_none());
}

#[test]
fn declaring_nodes_are_found_by_binding_and_by_key() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());

    let bar = member(&module, "bar");
    let binding = Binding::Method(resolver.get_method_binding(fx.bar).unwrap());
    assert_eq!(resolver.find_declaring_node(&binding), None);
    resolver.record_declaration(&binding, bar);
    assert_eq!(resolver.find_declaring_node(&binding), Some(bar));
    assert_eq!(resolver.find_declaring_node_by_key("Lp/Foo;.bar(I)V"), Some(bar));
    assert_eq!(resolver.find_declaring_node_by_key("Lp/Foo;.get()I"), None);
}

#[test]
fn names_resolve_in_their_recorded_scope() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());

    let read = value_of_any(&module);
    assert!(resolver.resolve_name(&module, read).is_none());
    resolver.record_scope(read, fx.body_scope);
    let a = resolver.resolve_name(&module, read).expect("parameter a");
    assert_eq!(a.kind(), BindingKind::Variable);
    let a = a.as_variable().unwrap();
    assert!(a.is_parameter());
    assert!(Arc::ptr_eq(a, &resolver.get_variable_binding(fx.a).unwrap()));
    assert_eq!(a.declaring_method(&resolver).unwrap().key(), "Lp/Foo;.bar(I)V");

    // A correspondence wins over the scope.
    resolver.record_correspondence(read, InternalRef::Variable(fx.x));
    let x = resolver.resolve_name(&module, read).unwrap();
    assert_eq!(x.name(), "x");

    // Only variable expressions are names.
    let any = local_declaration(&module, "any");
    resolver.record_scope(any, fx.body_scope);
    assert!(resolver.resolve_name(&module, any).is_none());
}

#[test]
fn qualified_prefixes_resolve_segment_by_segment() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());
    let node = value_of_any(&module);
    let segments = ["java", "lang", "String", "CASE"];

    // Nothing recorded for the node yet.
    assert!(resolver.resolve_qualified_prefix(node, &segments, 3).unwrap().is_none());
    resolver.record_scope(node, fx.body_scope);

    let string = resolver
        .resolve_qualified_prefix(node, &segments, 3)
        .unwrap()
        .expect("java.lang.String");
    assert_eq!(string.kind(), BindingKind::Type);
    assert!(string.same_instance(&Binding::Type(resolver.get_type_binding(fx.string).unwrap())));

    let lang = resolver
        .resolve_qualified_prefix(node, &segments, 2)
        .unwrap()
        .expect("java.lang");
    assert_eq!(lang.kind(), BindingKind::Package);
    assert_eq!(lang.name(), "java.lang");

    let java = resolver.resolve_qualified_prefix(node, &segments, 1).unwrap().unwrap();
    assert_eq!(java.name(), "java");

    // `CASE` is no member of String.
    assert!(resolver.resolve_qualified_prefix(node, &segments, 4).unwrap().is_none());
    assert!(resolver
        .resolve_qualified_prefix(node, &["nowhere", "Foo"], 2)
        .unwrap()
        .is_none());

    let foo_inner = resolver
        .resolve_qualified_prefix(node, &["Foo", "Inner"], 2)
        .unwrap()
        .expect("member type");
    assert_eq!(foo_inner.key(), "Lp/Foo$Inner;");
}

#[test]
fn prefix_lengths_out_of_range_are_errors() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());
    let node = value_of_any(&module);
    resolver.record_scope(node, fx.file_scope);
    let segments = ["java", "lang"];

    assert_eq!(
        resolver.resolve_qualified_prefix(node, &segments, 0).unwrap_err(),
        BindingError::PrefixOutOfRange { n: 0, len: 2 }
    );
    assert_eq!(
        resolver.resolve_qualified_prefix(node, &segments, 3).unwrap_err(),
        BindingError::PrefixOutOfRange { n: 3, len: 2 }
    );
}

#[test]
fn uncorresponded_parameters_recover_only_on_request() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let bar = member(&module, "bar");
    let param = find_node(&module, bar, |kind| matches!(kind, NodeKind::Parameter(_)));

    let strict = BindingResolver::new(fx.model.clone());
    assert!(strict.resolve_variable(&module, param).is_none());
    assert!(strict.type_of_declaration(&module, param).is_none());

    let lenient = BindingResolver::new(fx.model.clone()).recovering(true);
    let a = lenient.resolve_variable(&module, param).expect("recovered parameter");
    assert!(a.is_recovered());
    assert_eq!(a.name(), "a");
    assert_eq!(a.key(), "Recovered#int#0#a");
    assert!(a.declaring_method(&lenient).is_none());
    assert_eq!(lenient.type_of_declaration(&module, param).unwrap().name(), "int");
}
