//! Raw tree to typed AST conversion.
//!
//! One top-down pass over the raw tree. Each raw kind has a thin dispatch
//! arm that calls a dedicated construction routine; routines position the
//! nodes they build, repairing operator-only ranges with [`crate::positions`].

mod decls;
mod exprs;
mod stmts;
mod types;

use grove_core::{LineCol, PositionIndex, SmolStr};
use grove_syntax::{RawKind, RawNode, RawNodeId, RawTree, RecognizerOutput, SyntaxProblem};
use grove_types::{Diagnostic, Span};

use crate::ast::{Ast, ConstValue, ModuleNode, NodeId, NodeKind, Position, TypeKind};
use crate::error::ConvertError;
use crate::positions;

/// Diagnostic codes produced by the converter.
pub mod codes {
    pub const MISSING_METHOD_BODY: &str = "missing-method-body";
    pub const SUPER_CAST: &str = "super-cast";
    pub const NESTING_TOO_DEEP: &str = "nesting-too-deep";
}

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Statements and expressions nested deeper than this become
    /// placeholders.
    pub max_nesting_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertResult {
    pub module: ModuleNode,
    pub diagnostics: Vec<Diagnostic>,
    /// The module is a script made of nothing but rubbish.
    pub encountered_unrecoverable_error: bool,
}

/// Convert a recognizer result into a [`ModuleNode`].
pub fn convert(
    text: &str,
    output: &RecognizerOutput,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    tracing::debug!(
        target: "grove.ast",
        raw_nodes = output.tree.len(),
        problems = output.problems.len(),
        "converting module"
    );
    let mut conv = Converter::new(text, output, options);
    let result = conv.module(output.has_problems());
    match &result {
        Ok(result) => tracing::debug!(
            target: "grove.ast",
            nodes = result.module.ast.len(),
            diagnostics = result.diagnostics.len(),
            broken = result.encountered_unrecoverable_error,
            "converted module"
        ),
        Err(err) => tracing::debug!(target: "grove.ast", error = %err, "conversion failed"),
    }
    result
}

#[derive(Debug, Clone)]
struct TypeFrame {
    id: NodeId,
    kind: TypeKind,
    name: SmolStr,
    qualified_name: SmolStr,
}

pub(crate) struct Converter<'a> {
    text: &'a str,
    tree: &'a RawTree,
    problems: &'a [SyntaxProblem],
    index: PositionIndex,
    options: &'a ConvertOptions,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    reported_too_deep: bool,
    package: Option<SmolStr>,
    type_stack: Vec<TypeFrame>,
    /// First statement of the constructor body being converted; the only
    /// place a `this(..)`/`super(..)` call is allowed.
    ctor_call_slot: Option<RawNodeId>,
}

impl<'a> Converter<'a> {
    fn new(text: &'a str, output: &'a RecognizerOutput, options: &'a ConvertOptions) -> Self {
        Converter {
            text,
            tree: &output.tree,
            problems: &output.problems,
            index: PositionIndex::new(text),
            options,
            ast: Ast::default(),
            diagnostics: Vec::new(),
            depth: 0,
            reported_too_deep: false,
            package: None,
            type_stack: Vec::new(),
            ctor_call_slot: None,
        }
    }

    fn module(&mut self, has_problems: bool) -> Result<ConvertResult, ConvertError> {
        let mut module = ModuleNode::default();
        let roots = self.tree.roots();
        for &root in roots {
            match self.kind(root) {
                RawKind::PackageDef => module.package = Some(self.package_def(root)?),
                RawKind::Import | RawKind::StaticImport => module.imports.push(self.import(root)?),
                kind if kind.is_type_definition() => module.types.push(self.type_def(root)?),
                RawKind::MethodDef => module.methods.push(self.method_def(root)?),
                _ => module.statements.push(self.statement(root)?),
            }
        }

        let mut broken = looks_broken(&self.ast, &module) && module.methods.is_empty() && has_problems;
        if module.statements.is_empty() && module.methods.is_empty() && module.types.is_empty() {
            let ret = self.empty_script_statement(&module)?;
            module.statements.push(ret);
            if self.tree.is_empty() && has_problems {
                broken = true;
            }
        }

        if let (Some(first), Some(last)) = (module.statements.first(), module.statements.last()) {
            let first = self.ast.node(*first).pos;
            let last = self.ast.node(*last).pos;
            module.script_range = Some(Position::new(
                Span::new(first.range.start, last.range.end),
                first.start,
                last.end,
            ));
        }
        module.pos = Position::new(
            Span::new(0, usize::from(self.index.end())),
            LineCol::new(1, 1),
            LineCol::new(self.index.end_line(), self.index.end_column()),
        );

        if broken {
            tracing::debug!(target: "grove.ast", "module looks broken");
        }
        module.ast = std::mem::take(&mut self.ast);
        Ok(ConvertResult {
            module,
            diagnostics: std::mem::take(&mut self.diagnostics),
            encountered_unrecoverable_error: broken,
        })
    }

    /// `return null` placed on the line after the last import (or the
    /// package declaration).
    fn empty_script_statement(&mut self, module: &ModuleNode) -> Result<NodeId, ConvertError> {
        let target = module.imports.last().copied().or(module.package);
        let offset = match target {
            Some(target) => {
                let line = self.ast.node(target).pos.end.line;
                let next_line = usize::from(self.index.find_offset(line + 1, 1));
                next_line.min(usize::from(self.index.end()).saturating_sub(1))
            }
            None => 0,
        };
        let pos = positions::position_of_range(&self.index, Span::empty(offset))?;
        let value = self.alloc_pos(NodeKind::Constant(ConstValue::Null), pos);
        Ok(self.alloc_pos(NodeKind::Return { expr: Some(value) }, pos))
    }

    // --- raw tree access ----------------------------------------------------

    fn node(&self, id: RawNodeId) -> &'a RawNode {
        self.tree.node(id)
    }

    fn kind(&self, id: RawNodeId) -> RawKind {
        self.tree.kind(id)
    }

    fn text_of(&self, id: RawNodeId) -> &'a str {
        self.tree.text(id)
    }

    fn children(&self, id: RawNodeId) -> &'a [RawNodeId] {
        self.tree.children(id)
    }

    fn child(&self, id: RawNodeId, n: usize) -> Option<RawNodeId> {
        self.tree.child(id, n)
    }

    /// Child `n`, which must exist and be of `expected` kind.
    fn expect_child(
        &self,
        parent: RawNodeId,
        n: usize,
        expected: RawKind,
    ) -> Result<RawNodeId, ConvertError> {
        match self.child(parent, n) {
            Some(child) => {
                self.assert_kind(child, expected)?;
                Ok(child)
            }
            None => Err(self.missing_child(parent, expected)),
        }
    }

    fn assert_kind(&self, id: RawNodeId, expected: RawKind) -> Result<(), ConvertError> {
        if self.kind(id) == expected {
            return Ok(());
        }
        Err(self.unexpected(id, expected))
    }

    fn unexpected(&self, id: RawNodeId, expected: RawKind) -> ConvertError {
        ConvertError::Contract {
            message: format!(
                "Unexpected node type: {} found when expecting type: {expected}",
                self.kind(id)
            ),
            span: Some(self.pos(id).range),
        }
    }

    fn missing_child(&self, parent: RawNodeId, expected: RawKind) -> ConvertError {
        ConvertError::Contract {
            message: format!("No child node available in AST when expecting type: {expected}"),
            span: Some(self.pos(parent).range),
        }
    }

    fn pos(&self, id: RawNodeId) -> Position {
        let node = self.node(id);
        positions::position_of(&self.index, node.start, node.end)
    }

    fn source(&self, span: Span) -> &'a str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    // --- node construction --------------------------------------------------

    fn alloc_pos(&mut self, kind: NodeKind, pos: Position) -> NodeId {
        let id = self.ast.alloc(kind);
        positions::configure(&mut self.ast, id, pos);
        id
    }

    /// Allocate a node positioned at the raw node `raw`.
    fn alloc_at(&mut self, kind: NodeKind, raw: RawNodeId) -> NodeId {
        let pos = self.pos(raw);
        self.alloc_pos(kind, pos)
    }

    fn set_name_range(&mut self, id: NodeId, range: Span) {
        self.ast.node_mut(id).name_range = Some(range);
    }

    /// The `ERROR` constant left where an expression is missing.
    fn placeholder(&mut self, pos: Position) -> NodeId {
        tracing::trace!(target: "grove.ast", at = pos.range.start, "placeholder expression");
        self.alloc_pos(NodeKind::Constant(ConstValue::Error), pos)
    }

    fn structural(&self, raw: RawNodeId, message: impl Into<String>) -> ConvertError {
        let pos = self.pos(raw);
        let message = message.into();
        tracing::debug!(target: "grove.ast", %message, at = pos.range.start, "structural error");
        ConvertError::Structural {
            message,
            span: pos.range,
            start: pos.start,
        }
    }

    fn error_diagnostic(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.diagnostics
            .push(Diagnostic::error(code, message, Some(span)));
    }

    /// Depth guard shared by statements and expressions. Returns `None` when
    /// the limit is reached, after recording a placeholder diagnostic.
    fn descend(&mut self, raw: RawNodeId) -> Option<Position> {
        if self.depth < self.options.max_nesting_depth {
            self.depth += 1;
            return None;
        }
        let pos = self.pos(raw);
        if !self.reported_too_deep {
            self.reported_too_deep = true;
            tracing::warn!(
                target: "grove.ast",
                limit = self.options.max_nesting_depth,
                "nesting too deep, subtree replaced"
            );
            self.error_diagnostic(
                codes::NESTING_TOO_DEEP,
                format!(
                    "Nesting is deeper than the limit of {} levels",
                    self.options.max_nesting_depth
                ),
                pos.range,
            );
        }
        Some(pos)
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// The subtree at `id` holds a placeholder or covers the origin of a
    /// syntax problem.
    fn touched_by_recovery(&self, id: NodeId) -> bool {
        let range = self.ast.node(id).range();
        self.ast
            .descendants(id)
            .any(|node| crate::recovery::is_synthetic(&self.ast, node))
            || self
                .problems
                .iter()
                .any(|problem| (range.start..=range.end).contains(&problem.origin()))
    }
}

/// A script consisting only of an `ERROR` placeholder (or nothing, next to
/// script methods) is rubbish produced by recovery.
fn looks_broken(ast: &Ast, module: &ModuleNode) -> bool {
    if !module.types.is_empty() || (module.statements.is_empty() && module.methods.is_empty()) {
        return false;
    }
    match module.statements.as_slice() {
        [] => true,
        [only] => match ast.kind(*only) {
            NodeKind::ExprStmt { expr } => ast.kind(*expr).is_error_placeholder(),
            _ => false,
        },
        _ => false,
    }
}
