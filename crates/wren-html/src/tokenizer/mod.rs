//! Markup tokenizer module.
//!
//! A character-level finite-state machine producing a lazy, finite,
//! consume-once token sequence.

/// Token types produced by the tokenizer.
pub mod token;
/// Tokenizer state machine implementation.
pub mod tokenizer;

pub use token::{Attribute, Token};
pub use tokenizer::Tokenizer;
