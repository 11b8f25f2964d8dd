// Integration test harness for `grove-ast`.
//
// Keep integration tests as submodules of this harness rather than adding new
// top-level `tests/*.rs` files, which would each compile to their own binary.
mod declarations;
mod dumps;
mod nesting;
mod ranges;
mod recovery;
mod scenarios;
mod structural;

use grove_ast::ast::MethodDecl;
use grove_ast::{build_module, BuildResult, ConvertError, ConvertOptions, ModuleNode, NodeId, NodeKind};

pub(crate) fn build(src: &str) -> BuildResult {
    build_module(src, &ConvertOptions::default())
        .unwrap_or_else(|err| panic!("conversion of {src:?} failed: {err}"))
}

pub(crate) fn build_err(src: &str) -> ConvertError {
    match build_module(src, &ConvertOptions::default()) {
        Ok(_) => panic!("expected conversion of {src:?} to fail"),
        Err(err) => err,
    }
}

pub(crate) fn method<'m>(module: &'m ModuleNode, ty: NodeId, name: &str) -> (NodeId, &'m MethodDecl) {
    let id = module
        .find_member(ty, name, |kind| matches!(kind, NodeKind::Method(_)))
        .unwrap_or_else(|| panic!("no method {name}"));
    match module.ast.kind(id) {
        NodeKind::Method(decl) => (id, decl),
        other => panic!("expected a method, got {other:?}"),
    }
}

pub(crate) fn block_statements(module: &ModuleNode, block: NodeId) -> Vec<NodeId> {
    match module.ast.kind(block) {
        NodeKind::Block { statements } => statements.clone(),
        other => panic!("expected a block, got {other:?}"),
    }
}

/// The expression of an expression statement.
pub(crate) fn expr_of(module: &ModuleNode, stmt: NodeId) -> NodeId {
    match module.ast.kind(stmt) {
        NodeKind::ExprStmt { expr } => *expr,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}
