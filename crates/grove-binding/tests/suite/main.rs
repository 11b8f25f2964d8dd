// Integration test harness for `grove-binding`.
//
// Keep integration tests as submodules of this harness rather than adding new
// top-level `tests/*.rs` files, which would each compile to their own binary.
mod ast_entry_points;
mod identity;
mod keys;
mod problems;
mod recovered;

use std::sync::Arc;

use grove_ast::{build_module, ConvertOptions, ModuleNode, NodeId, NodeKind};
use grove_binding::model::{MethodId, ScopeId, TypeId, VarId};
use grove_binding::{InternalRef, MemberValue, ProblemReason, SemanticModel, TypeKind};

/// Hand-built engine output for a small project.
pub(crate) struct Fixture {
    pub model: Arc<SemanticModel>,
    pub object: TypeId,
    pub string: TypeId,
    pub int: TypeId,
    pub foo: TypeId,
    pub inner: TypeId,
    pub hidden: TypeId,
    pub lost: TypeId,
    pub gone: TypeId,
    pub x: VarId,
    pub secret: VarId,
    pub bar: MethodId,
    pub get: MethodId,
    pub misplaced: MethodId,
    pub a: VarId,
    pub file_scope: ScopeId,
    pub body_scope: ScopeId,
}

pub(crate) fn fixture() -> Fixture {
    let mut b = SemanticModel::builder();
    let java = b.package("java");
    let lang = b.package("java.lang");
    let p = b.package("p");
    b.module("app", &[p]);

    let object = b.class(lang, "Object");
    let string = b.class(lang, "String");
    b.set_superclass(string, object);
    let int = b.primitive("int");
    let void = b.primitive("void");

    let foo = b.class(p, "Foo");
    b.set_superclass(foo, object);
    let inner = b.member_type(foo, "Inner", TypeKind::Class);
    let x = b.field(foo, "x", int);
    let secret = b.field(foo, "secret", string);
    b.problem(InternalRef::Variable(secret), ProblemReason::NotVisible, None);
    let get = b.method(foo, "get", &[], Some(int));
    let bar = b.method(foo, "bar", &[("a", int)], Some(void));
    let a = b.parameters(bar)[0];
    let misplaced = b.method(foo, "bar", &[("a", int), ("b", int)], Some(void));
    b.problem(
        InternalRef::Method(misplaced),
        ProblemReason::NonStaticReferenceInStaticContext,
        Some(InternalRef::Method(bar)),
    );

    let hidden = b.class(p, "Hidden");
    b.problem(
        InternalRef::Type(hidden),
        ProblemReason::NotVisible,
        Some(InternalRef::Type(foo)),
    );
    let lost = b.class(p, "Lost");
    b.problem(InternalRef::Type(lost), ProblemReason::NotFound, None);
    let gone = b.missing_type(Some(p), "Gone");

    let deprecated = b.class(lang, "Deprecated");
    b.annotation(
        InternalRef::Type(foo),
        deprecated,
        vec![("since", MemberValue::String("1".into()))],
    );

    let file_scope = b.scope(None);
    b.bind(file_scope, "java", InternalRef::Package(java));
    b.bind(file_scope, "p", InternalRef::Package(p));
    b.bind(file_scope, "Foo", InternalRef::Type(foo));
    let body_scope = b.scope(Some(file_scope));
    b.bind(body_scope, "x", InternalRef::Variable(x));
    b.bind(body_scope, "a", InternalRef::Variable(a));

    Fixture {
        model: Arc::new(b.build().expect("valid model")),
        object,
        string,
        int,
        foo,
        inner,
        hidden,
        lost,
        gone,
        x,
        secret,
        bar,
        get,
        misplaced,
        a,
        file_scope,
        body_scope,
    }
}

/// Source matching the fixture.
pub(crate) const FOO_SOURCE: &str = "package p
class Foo {
  int x
  int get() { x }
  void bar(int a) {
    List<String> names = null
    Foo[][] grid = null
    def any = a
  }
}
";

pub(crate) fn parse(src: &str) -> ModuleNode {
    build_module(src, &ConvertOptions::default())
        .unwrap_or_else(|err| panic!("conversion of {src:?} failed: {err}"))
        .module
}

/// First node under `root` satisfying `pred`.
pub(crate) fn find_node(
    module: &ModuleNode,
    root: NodeId,
    pred: impl Fn(&NodeKind) -> bool,
) -> NodeId {
    module
        .ast
        .descendants(root)
        .find(|id| pred(module.ast.kind(*id)))
        .expect("node present")
}

/// The local declaration of `name` anywhere in the module.
pub(crate) fn local_declaration(module: &ModuleNode, name: &str) -> NodeId {
    let foo = module.types[0];
    find_node(module, foo, |kind| match kind {
        NodeKind::Declaration(decl) => module.ast.node(decl.target).name() == Some(name),
        _ => false,
    })
}
