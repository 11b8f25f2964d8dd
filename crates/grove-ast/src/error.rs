use grove_core::{LineCol, PositionError};
use grove_types::Span;

/// Errors that abort the conversion of a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// A user-facing error the converter does not recover from.
    #[error("{message} @ line {}, column {}", start.line, start.col)]
    Structural {
        message: String,
        span: Span,
        start: LineCol,
    },
    /// The raw tree has a shape the converter does not expect.
    #[error("{message}")]
    Contract { message: String, span: Option<Span> },
    #[error(transparent)]
    Position(#[from] PositionError),
}

impl ConvertError {
    pub fn message(&self) -> String {
        match self {
            ConvertError::Structural { message, .. } | ConvertError::Contract { message, .. } => {
                message.clone()
            }
            ConvertError::Position(err) => err.to_string(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ConvertError::Structural { span, .. } => Some(*span),
            ConvertError::Contract { span, .. } => *span,
            ConvertError::Position(_) => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, ConvertError::Structural { .. })
    }
}
