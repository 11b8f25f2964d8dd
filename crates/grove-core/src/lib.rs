//! Core shared types for grove.
//!
//! This crate is intentionally small: it owns the text model used to map
//! between 1-based (line, column) pairs and absolute offsets.

mod text;

pub use smol_str::SmolStr;
pub use text::{LineCol, PositionError, PositionIndex, TextRange, TextSize};
