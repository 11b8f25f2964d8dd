use grove_core::LineCol;
use grove_types::Span;
use serde::{Deserialize, Serialize};

use crate::raw::RawTree;

/// A syntax error reported by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxProblem {
    /// Where the problem originates. Usually empty or a single token.
    pub span: Span,
    pub start: LineCol,
    pub message: String,
}

impl SyntaxProblem {
    /// Offset the recovery pass attributes the problem to.
    pub fn origin(&self) -> usize {
        self.span.start
    }
}

/// Token classes that show up in the edit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Semi,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Identifier,
    Other,
}

impl TokenKind {
    pub fn text(self) -> &'static str {
        match self {
            TokenKind::Semi => ";",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Identifier => "<identifier>",
            TokenKind::Other => "<token>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditOp {
    Insert,
    Delete,
    Replace,
}

/// One token the recognizer synthesized, skipped or substituted.
///
/// Inserted tokens are zero width and sit at `offset`; deleted and replaced
/// tokens start at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenEdit {
    pub offset: usize,
    pub kind: TokenKind,
    pub op: EditOp,
}

impl TokenEdit {
    pub fn insert(offset: usize, kind: TokenKind) -> Self {
        Self {
            offset,
            kind,
            op: EditOp::Insert,
        }
    }

    pub fn delete(offset: usize, kind: TokenKind) -> Self {
        Self {
            offset,
            kind,
            op: EditOp::Delete,
        }
    }

    pub fn replace(offset: usize, kind: TokenKind) -> Self {
        Self {
            offset,
            kind,
            op: EditOp::Replace,
        }
    }
}

/// Everything the recognizer produces for a single file.
#[derive(Debug, Clone, Default)]
pub struct RecognizerOutput {
    pub tree: RawTree,
    pub problems: Vec<SyntaxProblem>,
    pub edits: Vec<TokenEdit>,
}

impl RecognizerOutput {
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }
}
