//! Position repair over already-built nodes.
//!
//! The recognizer reports some constructs with only their operator token
//! (binary operators, casts, index brackets) or with trailing whitespace
//! (property access). These helpers fix a node's range from the ranges of
//! nodes that are already correct. None of them look at raw node kinds.

use grove_core::{LineCol, PositionError, PositionIndex, TextSize};
use grove_types::Span;

use crate::ast::{Ast, NodeId, NodeKind, Position};
use crate::metadata::{keys, MetaValue};

/// Translate a raw (start, end) pair. A node without an end ("poor" node)
/// is collapsed onto its start.
pub fn position_of(index: &PositionIndex, start: LineCol, end: Option<LineCol>) -> Position {
    let end = end.unwrap_or(start);
    let from = usize::from(index.find_offset(start.line, start.col));
    let to = usize::from(index.find_offset(end.line, end.col)).max(from);
    Position::new(Span::new(from, to), start, end)
}

/// Position of an offset range, line/column looked up through `index`.
pub fn position_of_range(index: &PositionIndex, range: Span) -> Result<Position, PositionError> {
    let start = index.row_col(TextSize::from(range.start as u32))?;
    let end = index.row_col(TextSize::from(range.end as u32))?;
    Ok(Position::new(range, start, end))
}

pub fn configure(ast: &mut Ast, id: NodeId, pos: Position) {
    ast.node_mut(id).pos = pos;
}

/// Configure `id` from an enclosing expression wrapper.
///
/// A variable or constant that already has a narrower range keeps it and
/// records the wide one under [`keys::SOURCE_OFFSETS`]. Other nodes take the
/// wide range when it starts earlier (parenthesized expressions).
pub fn widen(ast: &mut Ast, id: NodeId, pos: Position) {
    let node = ast.node_mut(id);
    let narrow = node.pos;
    let keeps_narrow = matches!(node.kind, NodeKind::Variable { .. } | NodeKind::Constant(_));
    if keeps_narrow && narrow.is_set() {
        if pos.range.covers(narrow.range) && pos.range != narrow.range {
            node.meta
                .insert(keys::SOURCE_OFFSETS, MetaValue::Position(pos));
        }
        return;
    }
    if !narrow.is_set() || pos.range.start < narrow.range.start {
        if matches!(node.kind, NodeKind::ArrayNew { .. } | NodeKind::CtorCall { .. })
            && narrow.is_set()
        {
            node.meta
                .insert(keys::NEW_OFFSET, MetaValue::Offset(narrow.range.start));
        }
        node.pos = pos;
    }
}

/// Position used when another node's range is derived from `id`.
fn effective(ast: &Ast, id: NodeId) -> Position {
    let node = ast.node(id);
    node.meta
        .position(keys::SOURCE_OFFSETS)
        .unwrap_or(node.pos)
}

pub fn set_start_from(ast: &mut Ast, target: NodeId, source: NodeId) {
    let from = effective(ast, source);
    let node = ast.node_mut(target);
    node.pos.range.start = from.range.start;
    node.pos.start = from.start;
    if node.pos.range.end < node.pos.range.start {
        node.pos.range.end = from.range.end;
        node.pos.end = from.end;
    }
}

pub fn set_end_from(ast: &mut Ast, target: NodeId, source: NodeId) {
    let from = effective(ast, source);
    let node = ast.node_mut(target);
    node.pos.range.end = from.range.end;
    node.pos.end = from.end;
    if !node.pos.is_set() || node.pos.range.start > node.pos.range.end {
        node.pos.range.start = from.range.start;
        node.pos.start = from.start;
    }
}

/// `target` spans from the start of `first` to the end of `last`.
pub fn merge(ast: &mut Ast, target: NodeId, first: NodeId, last: NodeId) {
    set_start_from(ast, target, first);
    set_end_from(ast, target, last);
}

/// Trim trailing whitespace off the end of `id`.
pub fn chomp(
    ast: &mut Ast,
    id: NodeId,
    text: &str,
    index: &PositionIndex,
) -> Result<(), PositionError> {
    let range = ast.node(id).pos.range;
    let bytes = text.as_bytes();
    let mut end = range.end.min(bytes.len());
    while end > range.start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if end == range.end {
        return Ok(());
    }
    let end_lc = index.row_col(TextSize::from(end as u32))?;
    let node = ast.node_mut(id);
    node.pos.range.end = end;
    node.pos.end = end_lc;
    Ok(())
}
