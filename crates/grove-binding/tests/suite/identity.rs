use std::sync::Arc;

use grove_ast::NodeKind;
use grove_binding::{Binding, BindingResolver, BindingTables, InternalRef};

use crate::{find_node, fixture, parse, FOO_SOURCE};

#[test]
fn field_reached_through_members_and_references_is_one_binding() {
    let fx = fixture();
    let module = parse(FOO_SOURCE);
    let resolver = BindingResolver::new(fx.model.clone());

    let foo_node = module.types[0];
    let field_node = module
        .find_member(foo_node, "x", |kind| matches!(kind, NodeKind::Field(_)))
        .expect("field x");
    let get_node = module
        .find_member(foo_node, "get", |kind| matches!(kind, NodeKind::Method(_)))
        .expect("method get");
    let reference = find_node(&module, get_node, |kind| {
        matches!(kind, NodeKind::Variable { name } if name == "x")
    });
    resolver.record_correspondence(field_node, InternalRef::Variable(fx.x));
    resolver.record_correspondence(reference, InternalRef::Variable(fx.x));

    let foo = resolver.get_type_binding(fx.foo).expect("Foo");
    let via_members = foo
        .declared_fields(&resolver)
        .into_iter()
        .find(|field| field.name() == "x")
        .expect("x among Foo's fields");
    let via_reference = match resolver.resolve_name(&module, reference) {
        Some(Binding::Variable(variable)) => variable,
        other => panic!("expected a variable binding, got {other:?}"),
    };
    let via_declaration = resolver
        .resolve_variable(&module, field_node)
        .expect("field binding");

    assert!(via_members.is_equal_to(&via_reference));
    assert!(Arc::ptr_eq(&via_members, &via_reference));
    assert!(Arc::ptr_eq(&via_members, &via_declaration));
    assert!(via_members.is_field());
    assert_eq!(resolver.corresponding_node(InternalRef::Variable(fx.x)), Some(reference));
}

#[test]
fn concurrent_requests_publish_one_instance() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let ty = resolver.get_type_binding(fx.foo).expect("Foo");
                    let field = resolver.get_variable_binding(fx.x).expect("x");
                    let method = resolver
                        .find_binding_by_key("Lp/Foo;.bar(I)V")
                        .expect("bar by key");
                    (ty, field, method)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("no panic"))
            .collect()
    });

    let (first_ty, first_field, first_method) = &results[0];
    for (ty, field, method) in &results[1..] {
        assert!(Arc::ptr_eq(first_ty, ty));
        assert!(Arc::ptr_eq(first_field, field));
        assert!(first_method.same_instance(method));
    }
    let bar = resolver.get_method_binding(fx.bar).expect("bar");
    assert!(Binding::Method(bar).same_instance(first_method));
}

#[test]
fn resolvers_of_one_session_share_instances() {
    let fx = fixture();
    let tables = Arc::new(BindingTables::new());
    let first = BindingResolver::with_tables(fx.model.clone(), tables.clone());
    let second = BindingResolver::with_tables(fx.model.clone(), tables.clone());
    let other_session = BindingResolver::new(fx.model.clone());

    let a = first.get_type_binding(fx.string).unwrap();
    let b = second.get_type_binding(fx.string).unwrap();
    let c = other_session.get_type_binding(fx.string).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert!(a.is_equal_to(&c));
    assert_eq!(tables.len(), 1);
}

#[test]
fn members_and_annotations_are_interned_too() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());
    let foo = resolver.get_type_binding(fx.foo).unwrap();

    let superclass = foo.superclass(&resolver).expect("Object");
    assert!(Arc::ptr_eq(
        &superclass,
        &resolver.get_type_binding(fx.object).unwrap()
    ));
    let inner = foo.declared_types(&resolver);
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].qualified_name(), "p.Foo.Inner");
    assert!(Arc::ptr_eq(
        &inner[0].declaring_type(&resolver).unwrap(),
        &foo
    ));

    let methods = foo.declared_methods(&resolver);
    let names: Vec<_> = methods.iter().map(|m| m.name()).collect();
    // The misplaced overload resolves to its closest match when recovering
    // only; here it is dropped.
    assert_eq!(names, vec!["get", "bar"]);
    let bar = &methods[1];
    let params = bar.parameters(&resolver);
    assert_eq!(params.len(), 1);
    assert!(params[0].is_parameter());
    assert!(Arc::ptr_eq(&params[0].declaring_method(&resolver).unwrap(), bar));
    assert_eq!(bar.return_type(&resolver).unwrap().name(), "void");

    let annotations = foo.annotations(&resolver);
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].name(), "Deprecated");
    let pairs = annotations[0].member_value_pairs(&resolver);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].name(), "since");
    assert!(Arc::ptr_eq(
        &pairs[0].annotation(&resolver).unwrap(),
        &annotations[0]
    ));
    assert!(Arc::ptr_eq(&foo.annotations(&resolver)[0], &annotations[0]));

    let package = foo.package(&resolver).unwrap();
    assert_eq!(package.name_components(), vec!["p"]);
}
