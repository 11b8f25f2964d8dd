//! Tree traversal over an [`Ast`].

use crate::ast::{Ast, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(NodeId),
    Leave(NodeId),
}

pub trait Visitor {
    /// Called before the children of `id`. Returning `false` skips them
    /// (and the matching [`Visitor::leave`]).
    fn enter(&mut self, ast: &Ast, id: NodeId) -> bool {
        let _ = (ast, id);
        true
    }

    fn leave(&mut self, ast: &Ast, id: NodeId) {
        let _ = (ast, id);
    }
}

/// Depth-first walk of the subtree at `root`. Uses an explicit stack, so
/// arbitrarily deep trees are fine.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, root: NodeId, visitor: &mut V) {
    let mut events = Preorder::new(ast, root);
    while let Some(event) = events.next() {
        match event {
            WalkEvent::Enter(id) => {
                if !visitor.enter(ast, id) {
                    events.skip_subtree();
                }
            }
            WalkEvent::Leave(id) => visitor.leave(ast, id),
        }
    }
}

/// Enter/leave events in source order.
pub struct Preorder<'a> {
    ast: &'a Ast,
    stack: Vec<(NodeId, Option<std::vec::IntoIter<NodeId>>)>,
    skip: Option<NodeId>,
}

impl<'a> Preorder<'a> {
    pub fn new(ast: &'a Ast, root: NodeId) -> Self {
        Self {
            ast,
            stack: vec![(root, None)],
            skip: None,
        }
    }

    /// Do not descend into the node entered last.
    pub fn skip_subtree(&mut self) {
        if let Some((id, _)) = self.stack.last() {
            self.skip = Some(*id);
        }
    }
}

impl Iterator for Preorder<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        if let Some(skipped) = self.skip.take() {
            if let Some((id, _)) = self.stack.last() {
                if *id == skipped {
                    self.stack.pop();
                }
            }
        }
        let (id, children) = self.stack.last_mut()?;
        let id = *id;
        match children {
            None => {
                *children = Some(self.ast.children(id).into_iter());
                Some(WalkEvent::Enter(id))
            }
            Some(children) => match children.next() {
                Some(child) => {
                    self.stack.push((child, None));
                    self.next()
                }
                None => {
                    self.stack.pop();
                    Some(WalkEvent::Leave(id))
                }
            },
        }
    }
}
