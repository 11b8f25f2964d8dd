use pretty_assertions::assert_eq;

use grove_core::LineCol;

use crate::{recognize, EditOp, RawKind, RawNodeId, RawTree, TokenEdit, TokenKind, MISSING_IDENT};

fn sexp(tree: &RawTree, id: RawNodeId) -> String {
    let node = tree.node(id);
    let mut out = format!("{:?}", node.kind);
    if !node.text.is_empty() {
        out.push('=');
        out.push_str(&node.text);
    }
    if !node.children().is_empty() {
        let children: Vec<_> = node.children().iter().map(|c| sexp(tree, *c)).collect();
        out.push('(');
        out.push_str(&children.join(" "));
        out.push(')');
    }
    out
}

fn dump(src: &str) -> Vec<String> {
    let output = recognize(src);
    output
        .tree
        .roots()
        .iter()
        .map(|id| sexp(&output.tree, *id))
        .collect()
}

fn clean(src: &str) -> Vec<String> {
    let output = recognize(src);
    assert!(
        output.problems.is_empty(),
        "unexpected problems for {src:?}: {:?}",
        output.problems
    );
    dump(src)
}

#[test]
fn class_with_method_and_field() {
    assert_eq!(
        clean("class Foo {\n  int x = 1\n  void bar() { }\n}\n"),
        vec![
            "ClassDef=Foo(Modifiers Ident=Foo ObjBlock(\
             VariableDef=x(Modifiers Type=int(Ident=int) Ident=x Assign==(NumInt=1)) \
             MethodDef=bar(Modifiers Type=void(Ident=void) Ident=bar Parameters Slist)))"
                .to_string()
        ]
    );
}

#[test]
fn bare_return_before_closing_brace_gets_virtual_semicolon() {
    let src = "class Foo { void bar() { return } }";
    let output = recognize(src);
    assert_eq!(
        output.edits,
        vec![TokenEdit {
            offset: 31,
            kind: TokenKind::Semi,
            op: EditOp::Insert,
        }]
    );
    assert_eq!(output.problems.len(), 1);
    assert_eq!(output.problems[0].span.start, 31);
    assert_eq!(
        dump(src),
        vec![
            "ClassDef=Foo(Modifiers Ident=Foo ObjBlock(\
             MethodDef=bar(Modifiers Type=void(Ident=void) Ident=bar Parameters Slist(Return=return))))"
                .to_string()
        ]
    );
}

#[test]
fn return_inside_closure_needs_no_separator() {
    let output = recognize("list.each { return }\n");
    assert!(output.problems.is_empty(), "{:?}", output.problems);
    assert!(output.edits.is_empty());
}

#[test]
fn missing_assignment_value_is_synthesized() {
    let output = recognize("x =\n");
    assert_eq!(
        output.edits,
        vec![TokenEdit::insert(3, TokenKind::Identifier)]
    );
    assert_eq!(output.problems.len(), 1);
    assert_eq!(
        dump("x =\n"),
        vec![format!("Expr(Assign==(Ident=x Ident={MISSING_IDENT}))")]
    );
}

#[test]
fn binary_operators_report_only_their_token() {
    let output = recognize("a + b * c");
    let tree = &output.tree;
    let expr = tree.roots()[0];
    let plus = tree.first_child(expr).unwrap();
    assert_eq!(tree.kind(plus), RawKind::Plus);
    assert_eq!(tree.node(plus).start, LineCol::new(1, 3));
    assert_eq!(tree.node(plus).end, Some(LineCol::new(1, 4)));

    let star = tree.child(plus, 1).unwrap();
    assert_eq!(tree.kind(star), RawKind::Star);
    assert_eq!(tree.node(star).start, LineCol::new(1, 7));
}

#[test]
fn property_access_reports_trailing_whitespace() {
    let output = recognize("a.b   + c");
    let tree = &output.tree;
    let plus = tree.first_child(tree.roots()[0]).unwrap();
    let dot = tree.first_child(plus).unwrap();
    assert_eq!(tree.kind(dot), RawKind::Dot);
    assert_eq!(tree.node(dot).start, LineCol::new(1, 1));
    assert_eq!(tree.node(dot).end, Some(LineCol::new(1, 7)));
}

#[test]
fn multiple_declarators_become_sibling_variables() {
    let output = recognize("int a = 1, b\n");
    let tree = &output.tree;
    assert!(output.problems.is_empty(), "{:?}", output.problems);
    assert_eq!(tree.roots().len(), 2);
    let (first, second) = (tree.roots()[0], tree.roots()[1]);
    assert_eq!(tree.kind(first), RawKind::VariableDef);
    assert_eq!(tree.kind(second), RawKind::VariableDef);
    assert_eq!(tree.text(second), "b");

    let first_type = tree.child_of_kind(first, RawKind::Type).unwrap();
    let second_type = tree.child_of_kind(second, RawKind::Type).unwrap();
    assert_ne!(first_type, second_type);
    assert_eq!(tree.text(first_type), tree.text(second_type));
    assert_eq!(tree.node(first_type).start, tree.node(second_type).start);
    assert_eq!(tree.node(first_type).end, tree.node(second_type).end);
}

#[test]
fn named_arguments_and_command_calls() {
    assert_eq!(
        clean("new Foo(x: 1, y: 2)\n"),
        vec![
            "Expr(New=new(Type=Foo(Ident=Foo) Elist(LabeledArg=:(Ident=x NumInt=1) LabeledArg=:(Ident=y NumInt=2))))"
                .to_string()
        ]
    );
    assert_eq!(
        clean("println 'hi'\n"),
        vec!["Expr(MethodCall=<command>(Ident=println Elist(StringLiteral=hi)))".to_string()]
    );
}

#[test]
fn gstrings_alternate_strings_and_values() {
    assert_eq!(
        clean("\"a${b}c\"\n"),
        vec!["Expr(StringConstructor(StringLiteral=a Ident=b StringLiteral=c))".to_string()]
    );
}

#[test]
fn constructors_are_recognized_inside_their_class() {
    let dumped = clean("class P {\n  P(int a) { this(a, 0) }\n}\n");
    assert_eq!(
        dumped,
        vec![
            "ClassDef=P(Modifiers Ident=P ObjBlock(CtorIdent=P(Modifiers \
             Parameters(ParameterDef=a(Modifiers Type=int(Ident=int) Ident=a)) \
             Slist(CtorCall=this(Elist(Ident=a NumInt=0))))))"
                .to_string()
        ]
    );
}

#[test]
fn control_flow_statements() {
    let dumped = clean(
        "for (int i = 0; i < 3; i++) { }\nfor (x in xs) { }\nwhile (true) break\n",
    );
    assert_eq!(dumped.len(), 3);
    assert!(dumped[0].starts_with("For=for(ForInit(VariableDef=i("), "{}", dumped[0]);
    assert!(dumped[1].starts_with("For=for(ForInIterable(ParameterDef=x("), "{}", dumped[1]);
    assert_eq!(dumped[2], "While=while(True=true Break=break)");
}

#[test]
fn try_and_switch_shapes() {
    let dumped = clean(
        "try { a() } catch (IOException e) { } finally { }\n\
         switch (x) { case 1: a(); break\n default: b() }\n",
    );
    assert!(dumped[0].starts_with("Try=try(Slist("), "{}", dumped[0]);
    assert!(dumped[0].contains("Catch=catch(ParameterDef=e("), "{}", dumped[0]);
    assert!(dumped[0].contains("Finally=finally(Slist)"), "{}", dumped[0]);
    assert!(dumped[1].starts_with("Switch=switch(Ident=x CaseGroup(Case=case(NumInt=1) Slist("), "{}", dumped[1]);
    assert!(dumped[1].contains("CaseGroup(Default=default Slist("), "{}", dumped[1]);
}

#[test]
fn stray_tokens_are_skipped_with_delete_edits() {
    let output = recognize("a = 1 )\nb = 2\n");
    assert_eq!(output.problems.len(), 1);
    assert_eq!(output.edits, vec![TokenEdit::delete(6, TokenKind::RParen)]);
    assert_eq!(output.tree.roots().len(), 2);
}

#[test]
fn deep_nesting_is_cut_off_without_overflow() {
    let depth = 2_000;
    let src = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
    let output = recognize(&src);
    assert!(output
        .problems
        .iter()
        .any(|p| p.message.contains("nesting is too deep")));
    assert!(output.tree.depth() < depth);
}

#[test]
fn recognizer_never_panics_on_garbage() {
    for src in [
        "",
        "}",
        "class",
        "class {",
        "def foo(",
        "a ? : b",
        "[1, 2",
        "\"${",
        "new",
        "x.",
        "@",
        "switch (x) { y }",
    ] {
        let _ = recognize(src);
    }
}
