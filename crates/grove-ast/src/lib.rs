//! Typed Groovy AST built from the recognizer's raw tree.
//!
//! [`build_module`] runs the whole front-end for one file: recognition,
//! conversion and recovery propagation.

pub mod ast;
mod convert;
pub mod dump;
mod error;
pub mod metadata;
pub mod positions;
pub mod recovery;
pub mod visit;

pub use ast::{Ast, ModuleNode, Node, NodeId, NodeKind, Position};
pub use convert::{codes, convert, ConvertOptions, ConvertResult, DEFAULT_MAX_NESTING_DEPTH};
pub use dump::{dump, DumpFormat};
pub use error::ConvertError;
pub use metadata::{keys, MetaValue, Metadata};
pub use recovery::{propagate, RecoveryPropagator, RecoveryReport};

use grove_types::Diagnostic;

/// Diagnostic code of problems reported by the recognizer.
pub const SYNTAX_ERROR: &str = "syntax-error";

#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub module: ModuleNode,
    /// Syntax problems first, then converter diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    pub recovery: RecoveryReport,
    pub encountered_unrecoverable_error: bool,
}

impl BuildResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Recognize, convert and flag recovered nodes of `text`.
pub fn build_module(text: &str, options: &ConvertOptions) -> Result<BuildResult, ConvertError> {
    let output = grove_syntax::recognize(text);
    let ConvertResult {
        mut module,
        diagnostics: converted,
        encountered_unrecoverable_error,
    } = convert(text, &output, options)?;
    let recovery = propagate(&mut module, &output);

    let mut diagnostics: Vec<Diagnostic> = output
        .problems
        .iter()
        .map(|problem| Diagnostic::error(SYNTAX_ERROR, problem.message.clone(), Some(problem.span)))
        .collect();
    diagnostics.extend(converted);

    Ok(BuildResult {
        module,
        diagnostics,
        recovery,
        encountered_unrecoverable_error,
    })
}
