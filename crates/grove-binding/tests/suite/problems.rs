use std::sync::Arc;

use grove_binding::{
    BindingError, BindingResolver, InternalRef, ProblemReason, RecoveredSource, SemanticModel,
    TypeKind,
};
use pretty_assertions::assert_eq;

use crate::fixture;

#[test]
fn problems_are_hidden_unless_recovering() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone());
    assert!(resolver.get_type_binding(fx.hidden).is_none());
    assert!(resolver.get_type_binding(fx.lost).is_none());
    assert!(resolver.get_type_binding(fx.gone).is_none());
    assert!(resolver.get_variable_binding(fx.secret).is_none());
    assert!(resolver.get_method_binding(fx.misplaced).is_none());
    assert!(resolver.tables().is_empty());
}

#[test]
fn a_problem_type_with_a_closest_match_becomes_that_match() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let hidden = resolver.get_type_binding(fx.hidden).expect("closest match");
    let foo = resolver.get_type_binding(fx.foo).unwrap();
    assert!(Arc::ptr_eq(&hidden, &foo));
    assert!(!hidden.is_recovered());
}

#[test]
fn types_that_were_not_found_are_recovered() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);

    let lost = resolver.get_type_binding(fx.lost).expect("recovered");
    assert!(lost.is_recovered());
    assert_eq!(lost.name(), "Lost");
    assert_eq!(lost.qualified_name(), "p.Lost");
    assert_eq!(lost.key(), "Recovered#p.Lost#0");
    assert!(matches!(
        lost.recovered_source(),
        Some(RecoveredSource::InternalType(id)) if *id == fx.lost
    ));

    let gone = resolver.get_type_binding(fx.gone).expect("recovered");
    assert!(gone.is_recovered());
    assert_eq!(gone.qualified_name(), "p.Gone");
    assert_eq!(gone.kind(), TypeKind::Class);

    // Recovered bindings are rebuilt on every request; only their keys agree.
    let again = resolver.get_type_binding(fx.lost).unwrap();
    assert!(again.is_equal_to(&lost));
    assert!(resolver.tables().is_empty());
}

#[test]
fn an_invisible_field_is_still_that_field() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let secret = resolver.get_variable_binding(fx.secret).expect("the field itself");
    assert_eq!(secret.name(), "secret");
    assert_eq!(secret.internal(), Some(fx.secret));
    assert!(secret.is_field());
    assert!(!secret.is_recovered());
    assert_eq!(secret.ty(&resolver).unwrap().qualified_name(), "java.lang.String");
}

#[test]
fn a_misplaced_call_binds_to_the_closest_method() {
    let fx = fixture();
    let resolver = BindingResolver::new(fx.model.clone()).recovering(true);
    let misplaced = resolver.get_method_binding(fx.misplaced).expect("closest match");
    let bar = resolver.get_method_binding(fx.bar).unwrap();
    assert!(Arc::ptr_eq(&misplaced, &bar));
    assert_eq!(misplaced.key(), "Lp/Foo;.bar(I)V");
}

#[test]
fn an_ambiguous_name_without_a_candidate_stays_unresolved() {
    let mut b = SemanticModel::builder();
    let p = b.package("p");
    let twice = b.class(p, "Twice");
    b.problem(InternalRef::Type(twice), ProblemReason::Ambiguous, None);
    let resolver = BindingResolver::new(Arc::new(b.build().unwrap())).recovering(true);
    assert!(resolver.get_type_binding(twice).is_none());
}

#[test]
fn closest_matches_must_be_of_the_same_kind() {
    let mut b = SemanticModel::builder();
    let p = b.package("p");
    let foo = b.class(p, "Foo");
    let int = b.primitive("int");
    let x = b.field(foo, "x", int);
    b.problem(
        InternalRef::Type(foo),
        ProblemReason::NotVisible,
        Some(InternalRef::Variable(x)),
    );
    assert_eq!(
        b.build().unwrap_err(),
        BindingError::ClosestMatchKind {
            expected: "type",
            found: "variable",
        }
    );
}
