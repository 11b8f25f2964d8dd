//! Groovy recognizer and the raw tree it produces.
//!
//! [`recognize`] turns source text into a [`RawTree`] plus the syntax
//! problems and token edits recorded while recovering from errors. The tree
//! keeps grammar-level positions (operators report only their token), so it
//! is meant to be fed to `grove-ast`, not consumed directly.

mod lexer;
mod literals;
mod parser;
mod problems;
mod raw;

pub use literals::{parse_decimal, parse_integer, parse_number, LiteralError, LiteralValue};
pub use parser::{recognize, MAX_NESTING, MISSING_IDENT};
pub use problems::{EditOp, RecognizerOutput, SyntaxProblem, TokenEdit, TokenKind};
pub use raw::{Preorder, RawKind, RawNode, RawNodeId, RawTree, RawTreeBuilder};

#[cfg(test)]
mod tests;
