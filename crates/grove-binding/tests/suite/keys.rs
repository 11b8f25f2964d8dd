use std::sync::Arc;

use grove_binding::{BindingKind, BindingResolver, BindingTables, InternalRef, MemberValue};
use pretty_assertions::assert_eq;

use crate::fixture;

#[test]
fn keys_name_declarations_in_descriptor_form() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());

    assert_eq!(resolver.get_type_binding(fx.foo).unwrap().key(), "Lp/Foo;");
    assert_eq!(resolver.get_type_binding(fx.inner).unwrap().key(), "Lp/Foo$Inner;");
    assert_eq!(resolver.get_type_binding(fx.int).unwrap().key(), "I");
    assert_eq!(resolver.get_method_binding(fx.bar).unwrap().key(), "Lp/Foo;.bar(I)V");
    assert_eq!(resolver.get_method_binding(fx.get).unwrap().key(), "Lp/Foo;.get()I");
    assert_eq!(resolver.get_variable_binding(fx.x).unwrap().key(), "Lp/Foo;.x)I");
    assert_eq!(resolver.get_variable_binding(fx.a).unwrap().key(), "Lp/Foo;.bar(I)V#a");

    let foo = resolver.get_type_binding(fx.foo).unwrap();
    let annotation = &foo.annotations(&resolver)[0];
    assert_eq!(annotation.key(), "Lp/Foo;@Ljava/lang/Deprecated;");
    let pair = &annotation.member_value_pairs(&resolver)[0];
    assert_eq!(pair.key(), "Lp/Foo;@Ljava/lang/Deprecated;.since");
    assert_eq!(pair.value(), &MemberValue::String("1".into()));
    assert!(Arc::ptr_eq(&pair.annotation(&resolver).unwrap(), annotation));
}

#[test]
fn lookup_by_key_reaches_bindings_never_asked_for() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());
    assert!(resolver.tables().is_empty());

    let inner = resolver.find_binding_by_key("Lp/Foo$Inner;").expect("member type");
    assert_eq!(inner.kind(), BindingKind::Type);
    assert_eq!(inner.name(), "Inner");
    assert!(inner.same_instance(&resolver.binding_for(InternalRef::Type(fx.inner)).unwrap()));

    let x = resolver.find_binding_by_key("Lp/Foo;.x)I").expect("field");
    assert_eq!(x.kind(), BindingKind::Variable);
    assert!(x.as_variable().unwrap().is_field());

    let package = resolver.find_binding_by_key("java.lang").expect("package");
    assert_eq!(package.as_package().unwrap().name_components(), vec!["java", "lang"]);

    assert!(resolver.find_binding_by_key("Lp/Nowhere;").is_none());
    assert!(resolver.find_binding_by_key("").is_none());
}

#[test]
fn modules_list_their_packages() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());
    let module = resolver.find_binding_by_key("\"app").expect("module");
    assert_eq!(module.kind(), BindingKind::Module);
    assert_eq!(module.name(), "app");

    let grove_binding::Binding::Module(module) = module else {
        panic!("expected a module binding");
    };
    let packages: Vec<String> = module
        .packages(&resolver)
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(packages, vec!["p".to_string()]);
}

#[test]
fn keys_are_stable_across_sessions() {
    let fx = fixture();
    let first = BindingResolver::new(fx.model.clone());
    let second = BindingResolver::with_tables(fx.model.clone(), Arc::new(BindingTables::new()));

    let here = first.get_method_binding(fx.bar).unwrap();
    let there = second
        .find_binding_by_key(here.key())
        .and_then(|b| b.as_method().cloned())
        .expect("same method in the other session");
    assert!(here.is_equal_to(&there));
    assert!(!Arc::ptr_eq(&here, &there));
    assert_eq!(there.internal(), fx.bar);
}
