//! Recovery propagation.
//!
//! After conversion, flags the nodes that the recognizer's error recovery
//! produced or altered. Inside block bodies the token edit log decides;
//! outside them (signatures, declarations, script statements) a node is
//! flagged when it contains the origin of a syntax problem.

use grove_syntax::{EditOp, RecognizerOutput, SyntaxProblem, TokenEdit, TokenKind, MISSING_IDENT};

use crate::ast::{Ast, BinaryOp, ModuleNode, NodeId, NodeKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Flagged nodes, in the order they were flagged.
    pub recovered: Vec<NodeId>,
    /// Assignments and declarations whose synthetic value was dropped.
    pub collapsed: usize,
}

/// Tokens that legitimately end a node of the given kind.
fn closers(kind: &NodeKind) -> &'static [TokenKind] {
    match kind {
        NodeKind::Block { .. }
        | NodeKind::Closure { .. }
        | NodeKind::Type(_)
        | NodeKind::Switch { .. } => &[TokenKind::RBrace],
        NodeKind::ExprStmt { .. }
        | NodeKind::Return { .. }
        | NodeKind::Break { .. }
        | NodeKind::Continue { .. }
        | NodeKind::Throw { .. }
        | NodeKind::Assert { .. }
        | NodeKind::Empty => &[TokenKind::Semi],
        NodeKind::MethodCall { .. }
        | NodeKind::CtorCall { .. }
        | NodeKind::Args { .. }
        | NodeKind::Cast { .. } => &[TokenKind::RParen],
        NodeKind::List { .. }
        | NodeKind::Map { .. }
        | NodeKind::ArrayNew { .. }
        | NodeKind::Binary {
            op: BinaryOp::Index,
            ..
        } => &[TokenKind::RBracket],
        _ => &[],
    }
}

/// Placeholder values left by the converter or injected by the recognizer.
pub(crate) fn is_synthetic(ast: &Ast, id: NodeId) -> bool {
    match ast.kind(id) {
        NodeKind::Variable { name } => name == MISSING_IDENT,
        kind => kind.is_error_placeholder(),
    }
}

/// Flag recovered nodes of `module` and clean up synthetic assignments.
pub fn propagate(module: &mut ModuleNode, output: &RecognizerOutput) -> RecoveryReport {
    let mut propagator = RecoveryPropagator::new(&output.problems, &output.edits);
    propagator.run(module);
    propagator.finish()
}

pub struct RecoveryPropagator<'a> {
    problems: &'a [SyntaxProblem],
    edits: &'a [TokenEdit],
    consumed_problems: Vec<bool>,
    used_edits: Vec<bool>,
    depth: usize,
    report: RecoveryReport,
}

struct Frame {
    id: NodeId,
    children: Vec<NodeId>,
    next: usize,
}

impl<'a> RecoveryPropagator<'a> {
    pub fn new(problems: &'a [SyntaxProblem], edits: &'a [TokenEdit]) -> Self {
        Self {
            problems,
            edits,
            consumed_problems: vec![false; problems.len()],
            used_edits: vec![false; edits.len()],
            depth: 0,
            report: RecoveryReport::default(),
        }
    }

    pub fn run(&mut self, module: &mut ModuleNode) {
        if self.problems.is_empty() && self.edits.is_empty() {
            return;
        }
        tracing::debug!(
            target: "grove.ast",
            problems = self.problems.len(),
            edits = self.edits.len(),
            "propagating recovery"
        );
        for root in module.roots() {
            self.walk(&mut module.ast, root);
        }
        self.cleanup(&mut module.ast);
    }

    pub fn finish(self) -> RecoveryReport {
        self.report
    }

    /// Post-order walk with the ancestors kept on an explicit stack.
    fn walk(&mut self, ast: &mut Ast, root: NodeId) {
        let mut stack = vec![self.enter(ast, root)];
        while let Some(top) = stack.last_mut() {
            if let Some(&child) = top.children.get(top.next) {
                top.next += 1;
                let frame = self.enter(ast, child);
                stack.push(frame);
                continue;
            }
            if let Some(frame) = stack.pop() {
                self.exit(ast, frame.id, &stack);
            }
        }
    }

    fn enter(&mut self, ast: &Ast, id: NodeId) -> Frame {
        if matches!(ast.kind(id), NodeKind::Block { .. }) {
            if self.depth == 0 {
                let range = ast.node(id).range();
                for (problem, consumed) in self.problems.iter().zip(&mut self.consumed_problems) {
                    if !*consumed && range.contains(problem.origin()) {
                        *consumed = true;
                    }
                }
            }
            self.depth += 1;
        }
        Frame {
            id,
            children: ast.children(id),
            next: 0,
        }
    }

    fn exit(&mut self, ast: &mut Ast, id: NodeId, ancestors: &[Frame]) {
        if self.depth > 0 {
            self.check_edits(ast, id, ancestors);
        } else {
            self.check_problems(ast, id);
        }
        if matches!(ast.kind(id), NodeKind::Block { .. }) {
            self.depth -= 1;
        }
    }

    /// Each edit is attributed to the innermost node it touches, which is
    /// the first one to exit.
    fn check_edits(&mut self, ast: &mut Ast, id: NodeId, ancestors: &[Frame]) {
        let range = ast.node(id).range();
        for (edit, used) in self.edits.iter().zip(&mut self.used_edits) {
            if *used {
                continue;
            }
            match edit.op {
                EditOp::Insert if edit.offset == range.end => {
                    *used = true;
                    mark(ast, &mut self.report, id);
                    if closers(ast.kind(id)).contains(&edit.kind) {
                        continue;
                    }
                    for ancestor in ancestors.iter().rev() {
                        if ast.node(ancestor.id).end() != range.end {
                            break;
                        }
                        mark(ast, &mut self.report, ancestor.id);
                    }
                }
                EditOp::Insert if range.strictly_contains(edit.offset) => {
                    *used = true;
                    mark(ast, &mut self.report, id);
                }
                EditOp::Delete | EditOp::Replace if range.contains(edit.offset) => {
                    *used = true;
                    mark(ast, &mut self.report, id);
                }
                _ => {}
            }
        }
    }

    fn check_problems(&mut self, ast: &mut Ast, id: NodeId) {
        let range = ast.node(id).range();
        let hit = self
            .problems
            .iter()
            .zip(&self.consumed_problems)
            .any(|(problem, consumed)| !consumed && range.contains(problem.origin()));
        if hit {
            mark(ast, &mut self.report, id);
        }
    }

    /// `x = <placeholder>` collapses to `x`; `def x = <placeholder>` loses
    /// its value.
    fn cleanup(&mut self, ast: &mut Ast) {
        for idx in 0..ast.len() {
            let id = NodeId::from_raw(idx as u32);
            match ast.kind(id) {
                NodeKind::Binary {
                    op: BinaryOp::Assign,
                    lhs,
                    rhs,
                } if is_synthetic(ast, *rhs) => {
                    let lhs = ast.node(*lhs).clone();
                    let node = ast.node_mut(id);
                    node.kind = lhs.kind;
                    node.pos = lhs.pos;
                    node.name_range = lhs.name_range;
                    node.meta = lhs.meta;
                }
                NodeKind::Declaration(decl) if decl.value.is_some_and(|v| is_synthetic(ast, v)) => {
                    if let NodeKind::Declaration(decl) = &mut ast.node_mut(id).kind {
                        decl.value = None;
                    }
                }
                _ => continue,
            }
            self.report.collapsed += 1;
            mark(ast, &mut self.report, id);
            tracing::trace!(target: "grove.ast", node = id.idx(), "collapsed synthetic value");
        }
    }
}

fn mark(ast: &mut Ast, report: &mut RecoveryReport, id: NodeId) {
    let node = ast.node_mut(id);
    if node.recovered {
        return;
    }
    node.recovered = true;
    report.recovered.push(id);
    tracing::trace!(
        target: "grove.ast",
        node = id.idx(),
        kind = node.kind.name(),
        "recovered"
    );
}

#[cfg(test)]
mod tests {
    use grove_core::LineCol;
    use grove_types::Span;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Position;

    fn at(ast: &mut Ast, kind: NodeKind, start: usize, end: usize) -> NodeId {
        let id = ast.alloc(kind);
        ast.node_mut(id).pos = Position::new(
            Span::new(start, end),
            LineCol::new(1, start as u32 + 1),
            LineCol::new(1, end as u32 + 1),
        );
        id
    }

    fn var(ast: &mut Ast, name: &str, start: usize) -> NodeId {
        at(ast, NodeKind::Variable { name: name.into() }, start, start + 1)
    }

    /// `{ a + b }`: ids of `a`, `b`, the sum, its statement and the block.
    fn sum_in_block(ast: &mut Ast) -> [NodeId; 5] {
        let a = var(ast, "a", 2);
        let b = var(ast, "b", 6);
        let sum = at(ast, NodeKind::Binary { op: BinaryOp::Plus, lhs: a, rhs: b }, 2, 7);
        let stmt = at(ast, NodeKind::ExprStmt { expr: sum }, 2, 7);
        let block = at(ast, NodeKind::Block { statements: vec![stmt] }, 0, 9);
        [a, b, sum, stmt, block]
    }

    fn propagate_edits(module: &mut ModuleNode, edits: &[TokenEdit]) -> Vec<NodeId> {
        let mut propagator = RecoveryPropagator::new(&[], edits);
        propagator.run(module);
        propagator.finish().recovered
    }

    fn problem(origin: usize) -> SyntaxProblem {
        SyntaxProblem {
            span: Span::empty(origin),
            start: LineCol::new(1, origin as u32 + 1),
            message: "unexpected token".into(),
        }
    }

    #[test]
    fn trailing_insert_marks_ancestors_ending_at_the_same_offset() {
        let mut module = ModuleNode::default();
        let [a, b, sum, stmt, block] = sum_in_block(&mut module.ast);
        module.statements.push(block);

        let recovered = propagate_edits(&mut module, &[TokenEdit::insert(7, TokenKind::Identifier)]);
        assert_eq!(recovered, vec![b, sum, stmt]);
        assert!(!module.ast.node(a).recovered);
        assert!(!module.ast.node(block).recovered);
    }

    #[test]
    fn inserted_closer_stays_with_its_node() {
        let mut module = ModuleNode::default();
        let ret = at(&mut module.ast, NodeKind::Return { expr: None }, 2, 8);
        let block = at(&mut module.ast, NodeKind::Block { statements: vec![ret] }, 0, 8);
        module.statements.push(block);

        let recovered = propagate_edits(&mut module, &[TokenEdit::insert(8, TokenKind::Semi)]);
        assert_eq!(recovered, vec![ret]);
    }

    #[test]
    fn insert_inside_a_node_marks_only_that_node() {
        let mut module = ModuleNode::default();
        let [_, _, sum, _, block] = sum_in_block(&mut module.ast);
        module.statements.push(block);

        let recovered = propagate_edits(&mut module, &[TokenEdit::insert(4, TokenKind::Other)]);
        assert_eq!(recovered, vec![sum]);
    }

    #[test]
    fn deleted_and_replaced_tokens_mark_the_innermost_node() {
        let mut module = ModuleNode::default();
        let [a, b, sum, _, block] = sum_in_block(&mut module.ast);
        module.statements.push(block);

        let recovered = propagate_edits(
            &mut module,
            &[
                TokenEdit::delete(2, TokenKind::Other),
                TokenEdit::replace(6, TokenKind::Identifier),
            ],
        );
        assert_eq!(recovered, vec![a, b]);
        assert!(!module.ast.node(sum).recovered);
    }

    #[test]
    fn problems_outside_blocks_mark_enclosing_nodes() {
        // `x` then `{ y }`, with a problem at each variable.
        let mut module = ModuleNode::default();
        let x = var(&mut module.ast, "x", 0);
        let first = at(&mut module.ast, NodeKind::ExprStmt { expr: x }, 0, 1);
        let y = var(&mut module.ast, "y", 5);
        let inner = at(&mut module.ast, NodeKind::ExprStmt { expr: y }, 5, 6);
        let block = at(&mut module.ast, NodeKind::Block { statements: vec![inner] }, 3, 8);
        module.statements.extend([first, block]);

        let problems = [problem(0), problem(5)];
        let mut propagator = RecoveryPropagator::new(&problems, &[]);
        propagator.run(&mut module);
        let report = propagator.finish();

        assert_eq!(report.recovered, vec![x, first]);
        assert!(!module.ast.node(y).recovered);
        assert!(!module.ast.node(block).recovered);
    }

    #[test]
    fn nothing_to_propagate_leaves_the_tree_alone() {
        let mut module = ModuleNode::default();
        let [.., block] = sum_in_block(&mut module.ast);
        module.statements.push(block);
        assert!(propagate_edits(&mut module, &[]).is_empty());
    }
}
