use grove_ast::{dump, DumpFormat};

use crate::build;

const SOURCE: &str = "class Foo {\n  int size = 2\n  void bar() { return }\n}\n";

#[test]
fn tree_dump_lists_declarations_with_positions() {
    let result = build(SOURCE);
    let out = dump(&result.module, DumpFormat::Tree);
    let first = out.lines().next().expect("non-empty dump");
    assert!(first.starts_with("Type Foo [0.."), "{first}");
    assert!(out.contains("\n  Field size ["), "{out}");
    assert!(out.contains("Method bar ["), "{out}");
    assert!(out.contains("Return ["), "{out}");
    assert!(out.contains("(recovered)"), "{out}");
}

#[test]
fn html_dump_marks_recovered_nodes() {
    let result = build(SOURCE);
    let out = dump(&result.module, DumpFormat::Html);
    assert!(out.starts_with("<html><body>"));
    assert!(out.contains("<li class=\"recovered\">Return"), "{out}");
    assert_eq!(out.matches("<ul>").count(), out.matches("</ul>").count());
}

#[test]
fn source_dump_regenerates_declarations() {
    let result = build(SOURCE);
    let out = dump(&result.module, DumpFormat::Source);
    assert!(out.contains("class Foo"), "{out}");
    assert!(out.contains("bar()"), "{out}");
    assert!(out.contains("return"), "{out}");
}
